use courier_llm::{Content, Message, Tool, ToolCall, ToolChoice};
use serde_json::json;

#[test]
fn content_text_creation() {
    let content = Content::text("你好");
    assert_eq!(content.as_text(), Some("你好"));
    assert!(!content.has_image());
}

#[test]
fn multimodal_content_exposes_text_and_image() {
    let content = Content::multimodal("描述这张图", "data:image/png;base64,AAAA");
    assert_eq!(content.as_text(), Some("描述这张图"));
    assert!(content.has_image());
}

#[test]
fn message_roles() {
    assert_eq!(Message::system("s").role(), "system");
    assert_eq!(Message::human("h").role(), "user");
    assert_eq!(Message::ai("a").role(), "assistant");
    assert_eq!(Message::tool_result("call_1", "{}").role(), "tool");
}

#[test]
fn message_serialization_uses_wire_roles() {
    let json = serde_json::to_string(&Message::human("hello")).unwrap();
    assert!(json.contains("\"role\":\"user\""));

    let json = serde_json::to_string(&Message::ai("reply")).unwrap();
    assert!(json.contains("\"role\":\"assistant\""));
}

#[test]
fn message_deserialization_round_trip() {
    let json = r#"{"role":"user","content":"测试"}"#;
    let message: Message = serde_json::from_str(json).unwrap();
    assert_eq!(message.role(), "user");
}

#[test]
fn tool_result_carries_call_id() {
    let message = Message::tool_result("call_42", "{\"success\":true}");
    let json = serde_json::to_value(&message).unwrap();
    assert_eq!(json["tool_call_id"], "call_42");
    assert_eq!(json["role"], "tool");
}

#[test]
fn tool_definition_shape() {
    let tool = Tool::new(
        "web_search",
        "联网搜索",
        json!({
            "type": "object",
            "properties": {"query": {"type": "string"}},
            "required": ["query"]
        }),
    );

    let json = serde_json::to_value(&tool).unwrap();
    assert_eq!(json["type"], "function");
    assert_eq!(json["function"]["name"], "web_search");
    assert_eq!(json["function"]["parameters"]["required"][0], "query");
}

#[test]
fn tool_call_arguments_parse() {
    let call = ToolCall {
        id: "call_1".to_string(),
        tool_type: "function".to_string(),
        function: courier_llm::types::FunctionCall {
            name: "web_search".to_string(),
            arguments: r#"{"query":"gold price","count":3}"#.to_string(),
        },
    };

    #[derive(serde::Deserialize)]
    struct Args {
        query: String,
        count: u32,
    }

    let args: Args = call.parse_arguments().unwrap();
    assert_eq!(args.query, "gold price");
    assert_eq!(args.count, 3);
}

#[test]
fn tool_choice_serializes_as_bare_string() {
    assert_eq!(serde_json::to_value(ToolChoice::auto()).unwrap(), "auto");
    assert_eq!(serde_json::to_value(ToolChoice::none()).unwrap(), "none");
}

#[test]
fn tool_choice_force_names_the_function() {
    let json = serde_json::to_value(ToolChoice::force("web_search")).unwrap();
    assert_eq!(json["type"], "function");
    assert_eq!(json["function"]["name"], "web_search");
}

#[test]
fn assistant_tool_call_message_skips_empty_content() {
    let call = ToolCall {
        id: "call_1".to_string(),
        tool_type: "function".to_string(),
        function: courier_llm::types::FunctionCall {
            name: "web_search".to_string(),
            arguments: "{}".to_string(),
        },
    };
    let json = serde_json::to_value(Message::ai_with_tools(vec![call])).unwrap();
    assert!(json.get("content").is_none());
    assert_eq!(json["tool_calls"][0]["id"], "call_1");
}
