//! Prompt text for the generation service.

use crate::schema::{FIELD_DESCRIPTIONS, NOT_FOUND};

/// System instructions for schema extraction: the closed field list, the
/// exclusion rules for money and administrative content, the sentinel, and
/// a final self-check.
pub fn extraction_system_prompt() -> String {
    let mut fields = String::new();
    for (name, description) in FIELD_DESCRIPTIONS {
        fields.push_str(&format!("- \"{name}\": {description}\n"));
    }

    format!(
        r#"당신은 축제 기획서 분석 전문가입니다.
사용자가 제공하는 기획서 텍스트를 분석하여,
아래 항목에 해당하는 '구체적인 상세 내용'을 추출하고
반드시 JSON 형식으로만 응답해주세요.

[중요 규칙]
1. 오직 아래 목록에서 요청된 항목('title', 'date', 'location' 등)만 추출하세요.
2. '예산', '사업비', '총금액' 등 **금액(돈)과 관련된 모든 정보**는
   그것이 어떤 항목이든 **절대로** 요약에 포함하지 마세요.
3. '안전 대책(Safety Measures)', '행정 사항', '입찰' 등
   목록에 없는 다른 정보도 **절대로** 요약에 포함하지 마세요.

--- (추출할 항목 목록) ---
{fields}
만약 텍스트에서 특정 정보를 찾을 수 없다면, 해당 값은 "{NOT_FOUND}"으로 표기하세요.

[최종 확인 규칙]
응답하기 전, 당신이 생성한 JSON을 다시 한번 확인하세요.
JSON 내부에 '예산', '사업비' 등 **금액(돈)과 관련된 내용**이나,
'안전 대책' 등 --- (추출할 항목 목록) ---에 없었던 항목이 포함되어 있나요?
만약 그렇다면, 그 항목들을 **반드시 삭제**하고
오직 'title'부터 'directions'까지의 항목만 포함해서 응답하세요."#
    )
}

/// Wrap (already truncated) document text for the extraction request.
pub fn extraction_user_prompt(text: &str) -> String {
    format!(
        "다음 축제 기획서 텍스트를 분석하여 JSON으로 요약해줘:\n\n\
         --- 기획서 텍스트 시작 ---\n{text}\n--- 기획서 텍스트 끝 ---"
    )
}

pub fn cardnews_system_prompt(pages: usize) -> String {
    format!(
        r#"당신은 대한민국 최고의 축제 홍보 전문 카피라이터입니다.
제공된 '핵심 주제', '기획서 정보', '최신 트렌드'를 모두 조합하여,
'인스타그램 카드뉴스' {pages}장 분량의 홍보 문구(제목 + 본문)를 생성합니다.

[규칙]
1. '핵심 주제'의 분위기(예: 로맨틱, 감성적)를 텍스트 전체에 반영해야 합니다.
2. '기획서 정보'에 있는 구체적인 프로그램, 날짜, 장소를 반드시 포함해야 합니다.
3. '최신 트렌드' 키워드를 자연스럽게 문장에 녹여내야 합니다.
4. 문구는 짧고, 감각적이며, 이모지를 적절히 사용해야 합니다.
5. 응답은 반드시 {{"pages": [
    {{"page": 1, "title": "...", "body": "..."}},
    ...
    {{"page": {pages}, "title": "...", "body": "..."}}
   ]}} 형식의 JSON 객체로만 응답해야 합니다."#
    )
}

pub fn cardnews_user_prompt(
    theme: &str,
    summary_json: &str,
    trend_keywords: &[String],
    buzzwords: &[String],
    pages: usize,
) -> String {
    let or_none = |words: &[String]| {
        if words.is_empty() {
            NOT_FOUND.to_string()
        } else {
            words.join(", ")
        }
    };
    format!(
        "[핵심 주제]\n{theme}\n\n\
         [기획서 정보 (JSON)]\n{summary_json}\n\n\
         [최신 트렌드 키워드 (Google)]\n{}\n\n\
         [최신 소셜 트렌드 (Naver)]\n{}\n\n\
         ---\n위 정보를 모두 반영하여, 인스타그램 카드뉴스 {pages}장 분량의 JSON을 생성해줘.",
        or_none(trend_keywords),
        or_none(buzzwords),
    )
}
