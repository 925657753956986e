use crate::provider::SearchResponse;

/// Renders search results into the Markdown block injected as a synthetic
/// system message ahead of the final model call.
pub fn format_results_block(response: &SearchResponse) -> String {
    let mut block = format!("以下是针对“{}”的联网搜索结果：\n", response.query);

    for (index, result) in response.results.iter().enumerate() {
        block.push_str(&format!("\n### {}. {}\n", index + 1, result.title));
        if let Some(site_name) = &result.site_name {
            match &result.published_date {
                Some(date) => block.push_str(&format!("来源：{site_name}（{date}）\n")),
                None => block.push_str(&format!("来源：{site_name}\n")),
            }
        }
        block.push_str(&format!("链接：{}\n", result.url));

        let body = result
            .summary
            .as_deref()
            .or(result.snippet.as_deref())
            .unwrap_or("");
        if !body.is_empty() {
            block.push_str(body);
            block.push('\n');
        }
    }

    if response.results.is_empty() {
        block.push_str("\n（没有找到相关结果。）\n");
    }

    block.push_str("\n请基于以上搜索结果回答用户的问题；引用时注明来源，信息不足时如实说明。");
    block
}
