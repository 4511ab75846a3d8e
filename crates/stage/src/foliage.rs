use std::sync::Arc;

use glam::Vec3;
use momiji_assets::{AssetError, ModelData};
use momiji_common::{NodeId, Transform};
use momiji_scene::{NodeContent, SceneGraph};

/// Parse a positions file: one `x, y, z` triple per line, blank lines ignored.
pub fn parse_positions(path: &str, text: &str) -> Result<Vec<Vec3>, AssetError> {
    let mut positions = Vec::new();
    for (line_no, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let malformed = |reason: String| AssetError::Malformed {
            path: path.to_string(),
            reason: format!("line {}: {reason}", line_no + 1),
        };
        let coords = line
            .split(',')
            .map(|c| c.trim().parse::<f32>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| malformed(e.to_string()))?;
        match coords[..] {
            [x, y, z] => positions.push(Vec3::new(x, y, z)),
            _ => return Err(malformed(format!("expected 3 coordinates, got {}", coords.len()))),
        }
    }
    Ok(positions)
}

/// Splitmix64 sequence, used for reproducible decoration scales.
#[derive(Debug, Clone)]
pub struct SplitMix64 {
    state: u64,
}

impl SplitMix64 {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9e37_79b9_7f4a_7c15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
        z ^ (z >> 31)
    }

    /// Uniform in [0, 1).
    pub fn next_unit(&mut self) -> f32 {
        (self.next_u64() >> 40) as f32 / (1u32 << 24) as f32
    }
}

/// Place `base` with `transform` and hang one clone of `decoration` at each
/// position, each uniformly scaled by a random factor in [0, 1).
/// Clones share the decoration's geometry. Returns the base node.
pub fn compose(
    graph: &mut SceneGraph,
    label: &str,
    transform: Transform,
    base: ModelData,
    decoration: ModelData,
    positions: &[Vec3],
    seed: u64,
) -> NodeId {
    let root = graph.attach(label, transform, NodeContent::Model(Arc::new(base)));
    let decoration = Arc::new(decoration);
    let mut rng = SplitMix64::new(seed);
    for (i, position) in positions.iter().enumerate() {
        let scale = rng.next_unit();
        let placed = graph.attach_child(
            root,
            format!("{label}/decoration {i}"),
            Transform {
                position: *position,
                scale: Vec3::splat(scale),
                ..Transform::default()
            },
            NodeContent::Model(Arc::clone(&decoration)),
        );
        debug_assert!(placed.is_some());
    }
    tracing::debug!(label, decorations = positions.len(), "foliage composed");
    root
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::model;

    #[test]
    fn parses_comma_separated_lines() {
        let text = "1, 2, 3\n\n-4.5,0,7.25\n";
        let positions = parse_positions("leaves.txt", text).unwrap();
        assert_eq!(
            positions,
            vec![Vec3::new(1.0, 2.0, 3.0), Vec3::new(-4.5, 0.0, 7.25)]
        );
    }

    #[test]
    fn malformed_line_fails_the_file() {
        let err = parse_positions("leaves.txt", "1, 2, 3\n1, two, 3\n").unwrap_err();
        match err {
            AssetError::Malformed { path, reason } => {
                assert_eq!(path, "leaves.txt");
                assert!(reason.starts_with("line 2"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(parse_positions("leaves.txt", "1, 2\n").is_err());
    }

    #[test]
    fn splitmix_is_deterministic_and_in_range() {
        let mut a = SplitMix64::new(42);
        let mut b = SplitMix64::new(42);
        for _ in 0..1000 {
            let x = a.next_unit();
            assert_eq!(x, b.next_unit());
            assert!((0.0..1.0).contains(&x));
        }
        assert_ne!(SplitMix64::new(1).next_u64(), SplitMix64::new(2).next_u64());
    }

    #[test]
    fn compose_hangs_decorations_under_base() {
        let mut graph = SceneGraph::new();
        let positions = [Vec3::new(1.0, 5.0, 0.0), Vec3::new(-1.0, 6.0, 2.0)];
        let root = compose(
            &mut graph,
            "momiji",
            Transform::at(Vec3::new(10.0, 0.0, 0.0)),
            model("trunk.glb"),
            model("leaf.glb"),
            &positions,
            7,
        );

        assert_eq!(graph.model_count(), 1);
        let children: Vec<_> = graph.children(root).collect();
        assert_eq!(children.len(), 2);

        let mut rng = SplitMix64::new(7);
        let expected: Vec<f32> = (0..2).map(|_| rng.next_unit()).collect();
        for child in children {
            let node = graph.get(child).unwrap();
            let i = positions
                .iter()
                .position(|p| *p == node.transform.position)
                .unwrap();
            assert_eq!(node.transform.scale, Vec3::splat(expected[i]));
        }
    }
}
