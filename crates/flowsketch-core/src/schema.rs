/// Name of the single artifact the generator is asked to produce.
pub const ARTIFACT_NAME: &str = "flowchart.json";

/// Flowchart JSON contract, the single source of truth for the generation
/// prompt and the extractor's expectations.
pub const SCHEMA: &str = r#"{
  "nodes": [
    { "id": "string", "label": "string" }
  ],
  "edges": [
    { "source": "string", "target": "string", "label": "string" }
  ]
}"#;

/// Authoring rules handed to the generator alongside the schema.
pub const RULES: &str = "\
1. Every node id is unique and non-empty. Use short ids such as \"1\", \"2\", \"3\".\n\
2. List nodes in the order the process runs; the diagram stacks them top to bottom in that order.\n\
3. Every edge source and target must be the id of a node in the nodes list.\n\
4. Keep labels short: a few words per node, one verb phrase per edge. Use \"\" for an edge with no label.\n\
5. Decisions are ordinary nodes; label their outgoing edges with the outcome (e.g. \"yes\", \"no\").";
