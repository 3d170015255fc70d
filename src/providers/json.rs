// JSON payload extraction for structured text responses
//
// Models are asked for bare JSON but sometimes wrap it in markdown code fences
// or add a sentence around it. Parsing is strict: anything that does not
// deserialize into the expected shape is an error, never a partial result.

use serde::de::DeserializeOwned;

/// Deserialize a JSON object from model output.
pub fn parse_json_object<T: DeserializeOwned>(text: &str) -> Result<T, serde_json::Error> {
    let stripped = strip_markdown_fences(text);

    let direct = serde_json::from_str::<T>(stripped);
    if direct.is_ok() {
        return direct;
    }

    // Try to find a JSON object within the text
    if let (Some(start), Some(end)) = (stripped.find('{'), stripped.rfind('}')) {
        if start < end {
            if let Ok(value) = serde_json::from_str::<T>(&stripped[start..=end]) {
                return Ok(value);
            }
        }
    }

    direct
}

/// Strip leading/trailing markdown code fences (```json ... ``` or ``` ... ```)
pub fn strip_markdown_fences(s: &str) -> &str {
    let s = s.trim();
    let s = if let Some(rest) = s.strip_prefix("```json") {
        rest
    } else if let Some(rest) = s.strip_prefix("```") {
        rest
    } else {
        s
    };
    if let Some(rest) = s.strip_suffix("```") {
        rest.trim()
    } else {
        s.trim()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Post {
        caption: String,
    }

    #[test]
    fn test_strip_markdown_fences_json() {
        let s = "```json\n{\"a\":1}\n```";
        assert_eq!(strip_markdown_fences(s), "{\"a\":1}");
    }

    #[test]
    fn test_strip_markdown_fences_no_fences() {
        assert_eq!(strip_markdown_fences("  {\"a\":1} "), "{\"a\":1}");
    }

    #[test]
    fn test_parse_embedded_object() {
        let text = "Here is the copy:\n{\"caption\": \"Hi\"}\nEnjoy!";
        let post: Post = parse_json_object(text).unwrap();
        assert_eq!(post.caption, "Hi");
    }

    #[test]
    fn test_parse_rejects_wrong_shape() {
        assert!(parse_json_object::<Post>("{\"title\": \"Hi\"}").is_err());
        assert!(parse_json_object::<Post>("not json at all").is_err());
    }
}
