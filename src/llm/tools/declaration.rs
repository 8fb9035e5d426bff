//! Tool declarations generated from argument types

use schemars::{gen::SchemaSettings, JsonSchema};

use crate::llm::core::types::ToolDeclaration;

/// Build a tool declaration whose input schema is derived from `T`
///
/// Schemas are generated in OpenAPI 3 flavour with every subschema inlined,
/// since function declarations cannot follow `$ref`s. Doc comments on the
/// argument fields become property descriptions the model reads.
pub fn create_tool_declaration<T: JsonSchema>(
    name: impl Into<String>,
    description: impl Into<String>,
) -> ToolDeclaration {
    let settings = SchemaSettings::openapi3().with(|s| {
        s.inline_subschemas = true;
        s.meta_schema = None;
    });
    let schema = settings.into_generator().into_root_schema_for::<T>();

    ToolDeclaration {
        name: name.into(),
        description: description.into(),
        input_schema: serde_json::to_value(&schema)
            .unwrap_or_else(|_| serde_json::json!({ "type": "object" })),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[allow(dead_code)]
    #[derive(Deserialize, JsonSchema)]
    enum Level {
        Easy,
        Hard,
    }

    #[allow(dead_code)]
    #[derive(Deserialize, JsonSchema)]
    struct PracticeArgs {
        /// Topics to practise
        topics: Vec<String>,
        /// Difficulty wanted
        level: Option<Level>,
    }

    #[test]
    fn test_create_tool_declaration() {
        let decl = create_tool_declaration::<PracticeArgs>("practice", "Pick practice problems");

        assert_eq!(decl.name, "practice");
        assert_eq!(decl.description, "Pick practice problems");

        let schema = decl.input_schema.as_object().unwrap();
        assert!(!schema.contains_key("$schema"));
        assert_eq!(schema["type"], "object");
        assert!(schema["properties"]["topics"].is_object());
    }

    #[test]
    fn test_nested_types_are_inlined() {
        let decl = create_tool_declaration::<PracticeArgs>("practice", "p");
        let text = serde_json::to_string(&decl.input_schema).unwrap();
        assert!(!text.contains("$ref"));
        assert!(text.contains("Easy"));
    }

    #[test]
    fn test_doc_comments_become_descriptions() {
        let decl = create_tool_declaration::<PracticeArgs>("practice", "p");
        assert_eq!(
            decl.input_schema["properties"]["topics"]["description"],
            "Topics to practise"
        );
    }
}
