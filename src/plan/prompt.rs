//! Prompt text sent to the planning model.

use std::fmt::Write as _;

/// Builds the planning prompt.
///
/// The body is cut to `char_limit` characters (never inside a code point) so
/// the request stays within the model's context window.
pub fn build_prompt(
    brand_name: &str,
    title: &str,
    body: &str,
    char_limit: usize,
    slide_count: usize,
) -> String {
    let body = truncate_chars(body.trim(), char_limit);
    let content = slide_count.saturating_sub(2).max(1);

    let mut prompt = String::with_capacity(body.len() + 2048);
    let _ = writeln!(prompt, "당신은 {brand_name}의 비주얼 뉴스 에디터입니다.");
    prompt.push_str("독자가 읽지 않고 '보는' 카드뉴스를 기획하세요.\n\n");

    prompt.push_str("[기사 정보]\n");
    let _ = writeln!(prompt, "제목: {}", title.trim());
    let _ = writeln!(prompt, "내용: {body}\n");

    prompt.push_str("[필수 규칙]\n");
    let _ = writeln!(
        prompt,
        "1. 정확히 {slide_count}장으로 구성하세요: 표지 1장, 본문 {content}장, 마무리 1장."
    );
    prompt.push_str("2. HEAD는 8~20자의 짧은 핵심 문구로 쓰세요.\n");
    prompt.push_str("3. DESC는 최대 2문장, 80~150자로 압축하세요.\n");
    prompt.push_str("4. 숫자가 핵심인 장은 TYPE: DATA로 하고 HEAD에 숫자만 쓰세요 (예: 3.5%).\n");
    prompt.push_str("5. 인용이 핵심인 장은 TYPE: QUOTE로 하고 HEAD에 발언을 쓰세요.\n");
    prompt.push_str("6. 나머지 본문은 TYPE: CONTENT로 두세요. BOX, BAR를 직접 지정해도 됩니다.\n");
    prompt.push_str("7. 기사 분위기에 맞는 대표 색상을 COLOR_MAIN에 #RRGGBB로 쓰세요.\n");
    prompt.push_str("8. 해시태그 5개 안팎을 HASHTAGS에 한 줄로 쓰세요.\n");
    prompt.push_str("9. 마크다운 강조나 설명 문장 없이 아래 양식만 출력하세요.\n\n");

    prompt.push_str("[출력 양식]\n");
    prompt.push_str("COLOR_MAIN: #RRGGBB\n");
    prompt.push_str("HASHTAGS: #태그1 #태그2 #태그3\n\n");
    prompt.push_str("[SLIDE 1]\nTYPE: COVER\nHEAD: 강렬한 제목\nDESC: 짧은 부제\n\n");
    prompt.push_str("[SLIDE 2]\nTYPE: CONTENT\nHEAD: 소제목\nDESC: 내용\n\n");
    prompt.push_str("... (같은 형식 반복) ...\n\n");
    let _ = writeln!(prompt, "[SLIDE {slide_count}]\nTYPE: OUTRO\nHEAD: 마무리 문구\nDESC: 한 줄 요약");

    prompt
}

/// Returns at most the first `limit` characters of `text`.
pub fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((byte, _)) => &text[..byte],
        None => text,
    }
}
