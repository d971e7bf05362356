//! Recover a [`GraphDescription`] from whatever the generator sent back.
//!
//! The upstream payload shape has changed between API versions, and the
//! generator does not always honor the "JSON only" instruction. Extraction
//! therefore runs in stages: probe the known artifact locations in order,
//! pick the first artifact that looks like a JSON object, strip code fences,
//! parse, and check that `nodes` and `edges` are present. Individual
//! nodes/edges are not validated here; layout tolerates bad entries.
//!
//! The `{`-prefix selection and fence stripping are textual heuristics.
//! They can be fooled by prose that happens to start with a brace.

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use flowsketch_core::{Edge, GraphDescription, Node};

use crate::error::FlowchartError;

/// One named content blob returned by the generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub content: String,
}

impl Artifact {
    pub fn new(name: Option<&str>, content: impl Into<String>) -> Self {
        Self {
            name: name.map(str::to_string),
            content: content.into(),
        }
    }
}

/// A candidate location of the artifact list inside an upstream payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactProbe {
    /// `latestVersion.files[]`: the current chat API shape.
    LatestVersionFiles,
    /// `files[]`: the older flat shape.
    Files,
    /// `choices[].message.content`: chat-completions replies, one
    /// unnamed artifact per choice.
    ChatChoices,
}

impl ArtifactProbe {
    /// Probes in the order they are tried.
    pub const ORDER: [ArtifactProbe; 3] = [
        ArtifactProbe::LatestVersionFiles,
        ArtifactProbe::Files,
        ArtifactProbe::ChatChoices,
    ];

    pub fn location(self) -> &'static str {
        match self {
            ArtifactProbe::LatestVersionFiles => "latestVersion.files",
            ArtifactProbe::Files => "files",
            ArtifactProbe::ChatChoices => "choices[].message.content",
        }
    }

    /// Artifacts found at this location. Entries without string content are
    /// skipped.
    pub fn collect(self, payload: &Value) -> Vec<Artifact> {
        match self {
            ArtifactProbe::LatestVersionFiles => file_list(payload.pointer("/latestVersion/files")),
            ArtifactProbe::Files => file_list(payload.get("files")),
            ArtifactProbe::ChatChoices => payload
                .get("choices")
                .and_then(Value::as_array)
                .into_iter()
                .flatten()
                .filter_map(|choice| choice.pointer("/message/content")?.as_str())
                .map(|content| Artifact::new(None, content))
                .collect(),
        }
    }
}

fn file_list(files: Option<&Value>) -> Vec<Artifact> {
    files
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|file| {
            let content = file.get("content")?.as_str()?;
            let name = file.get("name").and_then(Value::as_str);
            Some(Artifact::new(name, content))
        })
        .collect()
}

/// The artifacts that were returned plus the graph extracted from them.
#[derive(Debug, Clone, PartialEq)]
pub struct Flowchart {
    pub artifacts: Vec<Artifact>,
    pub graph: GraphDescription,
}

/// Run every extraction stage on a raw upstream payload.
pub fn extract(payload: &Value) -> Result<GraphDescription, FlowchartError> {
    extract_flowchart(payload).map(|flowchart| flowchart.graph)
}

/// Like [`extract`], but also returns the artifact list that was used.
pub fn extract_flowchart(payload: &Value) -> Result<Flowchart, FlowchartError> {
    let artifacts = find_artifacts(payload)?;
    let selected = select_structured(&artifacts).ok_or_else(|| {
        warn!(artifacts = artifacts.len(); "No artifact contains a JSON object");
        FlowchartError::no_output()
    })?;
    debug!(name = selected.name.as_deref().unwrap_or("<unnamed>"); "Selected artifact");

    let graph = parse_graph(strip_fences(&selected.content))?;
    Ok(Flowchart { artifacts, graph })
}

/// Try each [`ArtifactProbe`] in order; the first non-empty list wins.
pub fn find_artifacts(payload: &Value) -> Result<Vec<Artifact>, FlowchartError> {
    for probe in ArtifactProbe::ORDER {
        let artifacts = probe.collect(payload);
        if !artifacts.is_empty() {
            debug!(location = probe.location(), count = artifacts.len(); "Found artifacts");
            return Ok(artifacts);
        }
    }
    warn!("Generator returned no artifacts");
    debug!(payload = payload.to_string(); "Raw generator payload");
    Err(FlowchartError::no_output())
}

/// First artifact whose content, once unfenced, starts with `{`.
pub fn select_structured(artifacts: &[Artifact]) -> Option<&Artifact> {
    artifacts
        .iter()
        .find(|a| strip_fences(&a.content).starts_with('{'))
}

/// Remove a surrounding Markdown code fence (```` ```json ```` ... ```` ``` ````)
/// and outer whitespace. Content without fences is only trimmed.
pub fn strip_fences(content: &str) -> &str {
    let mut text = content.trim();
    if let Some(rest) = text.strip_prefix("```") {
        // drop the info string, e.g. `json`
        text = match rest.find('\n') {
            Some(newline) if is_info_string(&rest[..newline]) => &rest[newline + 1..],
            Some(_) => rest,
            None => rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric()),
        };
    }
    let text = text.trim_end();
    text.strip_suffix("```").unwrap_or(text).trim()
}

fn is_info_string(line: &str) -> bool {
    line.trim()
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Parse cleaned artifact content and check the top-level shape.
pub fn parse_graph(content: &str) -> Result<GraphDescription, FlowchartError> {
    let value: Value = serde_json::from_str(content).map_err(|source| {
        warn!(error = source.to_string(), length = content.len(); "Artifact is not valid JSON");
        debug!(content = content; "Unparsed artifact content");
        FlowchartError::Parse {
            content: content.to_string(),
            source,
        }
    })?;
    graph_from_value(value)
}

fn graph_from_value(value: Value) -> Result<GraphDescription, FlowchartError> {
    let Value::Object(mut root) = value else {
        return Err(FlowchartError::Validation(
            "top-level value is not an object".to_string(),
        ));
    };
    let nodes = take_array(&mut root, "nodes")?;
    let edges = take_array(&mut root, "edges")?;

    Ok(GraphDescription {
        nodes: entries::<Node>(nodes, "node"),
        edges: entries::<Edge>(edges, "edge"),
    })
}

fn take_array(root: &mut Map<String, Value>, field: &str) -> Result<Vec<Value>, FlowchartError> {
    match root.remove(field) {
        Some(Value::Array(items)) => Ok(items),
        Some(_) => Err(FlowchartError::Validation(format!("`{field}` is not an array"))),
        None => Err(FlowchartError::Validation(format!("missing `{field}` array"))),
    }
}

/// Convert object entries leniently; anything that is not an object is
/// dropped.
fn entries<T: serde::de::DeserializeOwned>(items: Vec<Value>, kind: &str) -> Vec<T> {
    items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| {
            if !item.is_object() {
                warn!(kind = kind, index = index; "Dropping non-object entry");
                return None;
            }
            serde_json::from_value(item)
                .map_err(|e| {
                    warn!(
                        kind = kind,
                        index = index,
                        error = e.to_string();
                        "Dropping unreadable entry"
                    )
                })
                .ok()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const LOGIN: &str = r#"{"nodes":[{"id":"1","label":"Start"},{"id":"2","label":"Enter credentials"}],"edges":[{"source":"1","target":"2"}]}"#;

    fn login_graph() -> GraphDescription {
        GraphDescription::new(
            vec![Node::new("1", "Start"), Node::new("2", "Enter credentials")],
            vec![Edge::new("1", "2")],
        )
    }

    #[test]
    fn latest_version_files_take_priority() {
        let payload = json!({
            "latestVersion": {"files": [{"name": "flowchart.json", "content": LOGIN}]},
            "files": [{"name": "old.json", "content": "{\"nodes\":[],\"edges\":[]}"}],
        });
        let flowchart = extract_flowchart(&payload).unwrap();
        assert_eq!(flowchart.graph, login_graph());
        assert_eq!(flowchart.artifacts[0].name.as_deref(), Some("flowchart.json"));
    }

    #[test]
    fn empty_primary_location_falls_through_to_files() {
        let payload = json!({
            "latestVersion": {"files": []},
            "files": [{"content": LOGIN}],
        });
        assert_eq!(extract(&payload).unwrap(), login_graph());
    }

    #[test]
    fn chat_choices_are_the_last_probe() {
        let payload = json!({"choices": [{"message": {"role": "assistant", "content": LOGIN}}]});
        let artifacts = find_artifacts(&payload).unwrap();
        assert_eq!(artifacts, vec![Artifact::new(None, LOGIN)]);
        assert_eq!(extract(&payload).unwrap(), login_graph());
    }

    #[test]
    fn files_without_string_content_are_skipped() {
        let payload = json!({"files": [{"name": "a"}, {"name": "b", "content": 3}]});
        assert!(matches!(
            find_artifacts(&payload),
            Err(FlowchartError::Generation(_))
        ));
    }

    #[test]
    fn no_artifacts_anywhere_is_generation_error() {
        let err = extract(&json!({"id": "chat-1"})).unwrap_err();
        assert!(matches!(
            err,
            FlowchartError::Generation(ref m) if m == "no usable output produced"
        ));
    }

    #[test]
    fn prose_only_artifacts_are_generation_error() {
        let payload = json!({"files": [
            {"name": "README.md", "content": "Here is your flowchart of the login process."}
        ]});
        assert!(matches!(extract(&payload), Err(FlowchartError::Generation(_))));
    }

    #[test]
    fn prose_artifact_before_json_is_skipped() {
        let payload = json!({"files": [
            {"name": "notes.md", "content": "Login flow, as requested."},
            {"name": "flowchart.json", "content": format!("\n  {LOGIN}\n")},
        ]});
        assert_eq!(extract(&payload).unwrap(), login_graph());
    }

    #[test]
    fn fenced_content_parses_like_plain_content() {
        let fenced = format!("```json\n{LOGIN}\n```");
        assert_eq!(strip_fences(&fenced), LOGIN);

        let payload = json!({"files": [{"content": fenced}]});
        let plain = json!({"files": [{"content": LOGIN}]});
        assert_eq!(extract(&payload).unwrap(), extract(&plain).unwrap());
    }

    #[test]
    fn strip_fences_handles_bare_and_one_line_fences() {
        assert_eq!(strip_fences("```\n{}\n```"), "{}");
        assert_eq!(strip_fences("```json{\"a\":1}```"), "{\"a\":1}");
        assert_eq!(strip_fences("  {\"a\":1}\n```  "), "{\"a\":1}");
        assert_eq!(strip_fences("plain"), "plain");
        assert_eq!(
            strip_fences("```{\"nodes\":[],\n\"edges\":[]}\n```"),
            "{\"nodes\":[],\n\"edges\":[]}"
        );
        assert_eq!(strip_fences("```json-5 \n{}\n```"), "{}");
    }

    #[test]
    fn multiline_json_glued_to_fence_is_recovered() {
        let payload = json!({
            "files": [{"content": "```{\"nodes\":[{\"id\":\"1\",\"label\":\"A\"}],\n\"edges\":[]}\n```"}]
        });
        let graph = extract(&payload).unwrap();
        assert_eq!(graph.nodes, vec![Node::new("1", "A")]);
        assert!(graph.edges.is_empty());
    }

    #[test]
    fn malformed_json_is_parse_error_with_content() {
        let payload = json!({"files": [{"content": "{\"nodes\": [}"}]});
        match extract(&payload) {
            Err(FlowchartError::Parse { content, .. }) => assert_eq!(content, "{\"nodes\": [}"),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn missing_edges_is_validation_error() {
        let err = parse_graph(r#"{"nodes": []}"#).unwrap_err();
        assert!(matches!(err, FlowchartError::Validation(ref m) if m == "missing `edges` array"));
    }

    #[test]
    fn wrong_typed_nodes_is_validation_error() {
        let err = parse_graph(r#"{"nodes": {"id": "1"}, "edges": []}"#).unwrap_err();
        assert!(matches!(err, FlowchartError::Validation(ref m) if m == "`nodes` is not an array"));
    }

    #[test]
    fn malformed_entries_are_tolerated() {
        let graph = parse_graph(
            r#"{"nodes": [{"id": 1, "label": 5}, "stray", {"label": "no id"}],
                "edges": [{"source": 1, "target": "99", "label": null}, 42]}"#,
        )
        .unwrap();
        assert_eq!(graph.nodes, vec![Node::new("1", ""), Node::new("", "no id")]);
        assert_eq!(graph.edges, vec![Edge::new("1", "99")]);
    }
}
