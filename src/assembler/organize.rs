use serde::Serialize;

use crate::models::Segment;

/// A top-level segment with the sub-steps grouped under it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentNode<'a> {
    pub segment: &'a Segment,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<&'a Segment>,
}

/// Group sub-steps under the tool call that owns them.
///
/// A sub-step belongs to the nearest preceding `tool_call` whose `tool`
/// equals its `parent_tool`, or failing that the first following one, so
/// replayed histories that store a sub-step before its parent still nest.
/// Sub-steps without a matching tool call stay at the top level.
pub fn organize_segments(segments: &[Segment]) -> Vec<SegmentNode<'_>> {
    let parent_of: Vec<Option<usize>> = segments
        .iter()
        .enumerate()
        .map(|(idx, segment)| match segment {
            Segment::SubStep(step) => step
                .parent_tool
                .as_deref()
                .and_then(|parent| owning_tool_call(segments, idx, parent)),
            _ => None,
        })
        .collect();

    let mut nodes: Vec<SegmentNode<'_>> = Vec::new();
    let mut node_of: Vec<Option<usize>> = vec![None; segments.len()];

    for (idx, segment) in segments.iter().enumerate() {
        if parent_of[idx].is_none() {
            node_of[idx] = Some(nodes.len());
            nodes.push(SegmentNode {
                segment,
                children: Vec::new(),
            });
        }
    }

    for (idx, segment) in segments.iter().enumerate() {
        if let Some(node) = parent_of[idx].and_then(|parent| node_of[parent]) {
            nodes[node].children.push(segment);
        }
    }

    nodes
}

fn owning_tool_call(segments: &[Segment], at: usize, tool: &str) -> Option<usize> {
    let is_owner = |s: &Segment| matches!(s, Segment::ToolCall(call) if call.tool == tool);

    segments[..at].iter().rposition(is_owner).or_else(|| {
        segments[at + 1..]
            .iter()
            .position(is_owner)
            .map(|offset| at + 1 + offset)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SegmentKind, SegmentState, SubStepSegment, ToolCallSegment};

    fn tool(name: &str) -> Segment {
        Segment::ToolCall(ToolCallSegment {
            state: SegmentState::completed(),
            tool: name.to_string(),
            title: None,
            input: None,
            progress: Vec::new(),
            result: None,
            success: true,
            error: None,
        })
    }

    fn step(id: &str, parent: Option<&str>) -> Segment {
        Segment::SubStep(SubStepSegment {
            state: SegmentState::completed(),
            step_id: id.to_string(),
            parent_tool: parent.map(str::to_string),
            title: None,
            result: None,
        })
    }

    fn child_ids(node: &SegmentNode<'_>) -> Vec<String> {
        node.children
            .iter()
            .filter_map(|s| s.correlation_key().map(str::to_string))
            .collect()
    }

    #[test]
    fn test_sub_steps_nest_under_parent() {
        let segments = vec![
            tool("fetch_content"),
            step("s1", Some("fetch_content")),
            step("s2", Some("fetch_content")),
        ];
        let nodes = organize_segments(&segments);
        assert_eq!(nodes.len(), 1);
        assert_eq!(child_ids(&nodes[0]), vec!["s1", "s2"]);
    }

    #[test]
    fn test_sub_step_before_parent_still_nests() {
        let segments = vec![step("s1", Some("fetch_content")), tool("fetch_content")];
        let nodes = organize_segments(&segments);
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].segment.kind(), SegmentKind::ToolCall);
        assert_eq!(child_ids(&nodes[0]), vec!["s1"]);
    }

    #[test]
    fn test_repeated_tool_prefers_nearest_preceding_call() {
        let segments = vec![
            tool("search"),
            step("s1", Some("search")),
            tool("search"),
            step("s2", Some("search")),
        ];
        let nodes = organize_segments(&segments);
        assert_eq!(nodes.len(), 2);
        assert_eq!(child_ids(&nodes[0]), vec!["s1"]);
        assert_eq!(child_ids(&nodes[1]), vec!["s2"]);
    }

    #[test]
    fn test_orphan_sub_steps_stay_top_level() {
        let segments = vec![
            step("s1", Some("missing")),
            tool("search"),
            step("s2", None),
        ];
        let nodes = organize_segments(&segments);
        assert_eq!(nodes.len(), 3);
        assert!(nodes.iter().all(|n| n.children.is_empty()));
        assert_eq!(nodes[0].segment.kind(), SegmentKind::SubStep);
    }

    #[test]
    fn test_serializes_children_inline() {
        let segments = vec![tool("t"), step("s1", Some("t"))];
        let json = serde_json::to_value(organize_segments(&segments)).unwrap();
        assert_eq!(json[0]["segment"]["type"], "tool_call");
        assert_eq!(json[0]["children"][0]["step_id"], "s1");
    }
}
