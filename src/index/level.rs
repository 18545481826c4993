//! One zoom level of the cluster tree and the greedy pass that builds the
//! next coarser level from it.

use rstar::RTree;
use rstar::primitives::GeomWithData;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

/// R-tree entry: projected position plus the node's slot in its level.
pub(crate) type LevelEntry = GeomWithData<[f64; 2], usize>;

/// What a level node stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NodeKind {
    /// Index into the index's point list
    Leaf(usize),
    /// Id of a cluster record
    Cluster(u64),
}

/// A point or cluster positioned in unit-square space.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Node {
    pub x: f64,
    pub y: f64,
    pub count: usize,
    pub kind: NodeKind,
}

/// Bookkeeping kept for every cluster ever formed, independent of level.
#[derive(Debug, Clone)]
pub(crate) struct ClusterRecord {
    pub count: usize,
    /// Zoom at which the cluster was formed; its children live one level finer
    pub zoom: u8,
    pub children: Vec<Node>,
}

/// All nodes visible at one zoom.
pub(crate) struct Level {
    pub nodes: Vec<Node>,
    /// `owner[p]` is the slot of the node that holds point `p` at this zoom
    pub owner: Vec<usize>,
}

impl Level {
    /// The identity level: one leaf per point, in input order.
    pub fn identity(nodes: Vec<Node>) -> Self {
        let owner = (0..nodes.len()).collect();
        Self { nodes, owner }
    }

    /// Fold `finer` through one agglomeration pass.
    pub fn coarsen(finer: &Level, folded: Folded) -> Self {
        let owner = finer.owner.iter().map(|&slot| folded.parents[slot]).collect();
        Self {
            nodes: folded.nodes,
            owner,
        }
    }
}

pub(crate) fn tree_of(nodes: &[Node]) -> RTree<LevelEntry> {
    let entries = nodes
        .iter()
        .enumerate()
        .map(|(slot, node)| LevelEntry::new([node.x, node.y], slot))
        .collect();
    RTree::bulk_load(entries)
}

/// Output of one agglomeration pass.
pub(crate) struct Folded {
    pub nodes: Vec<Node>,
    /// `parents[s]` is the coarser slot that finer slot `s` ended up in
    pub parents: Vec<usize>,
}

/// Parameters of one agglomeration pass.
pub(crate) struct Pass {
    pub zoom: u8,
    /// Cluster radius in unit-square units at `zoom`
    pub radius: f64,
    pub min_points: usize,
}

/// Greedily fold the nodes of `finer` into the nodes of the level at `pass.zoom`.
///
/// Nodes are visited in slot order. An unvisited node absorbs every unvisited
/// neighbour within the radius; if the combined count reaches `min_points`
/// they become one cluster at their count-weighted centroid, otherwise all of
/// them carry over unchanged.
pub(crate) fn agglomerate(
    finer: &[Node],
    tree: &RTree<LevelEntry>,
    pass: &Pass,
    clusters: &mut FxHashMap<u64, ClusterRecord>,
    next_id: &mut u64,
) -> Folded {
    let squared_radius = pass.radius * pass.radius;
    let mut visited = vec![false; finer.len()];
    let mut parents = vec![0; finer.len()];
    let mut coarser = Vec::with_capacity(finer.len());

    for slot in 0..finer.len() {
        if visited[slot] {
            continue;
        }
        visited[slot] = true;

        let seed = finer[slot];
        let neighbours: SmallVec<[usize; 16]> = tree
            .locate_within_distance([seed.x, seed.y], squared_radius)
            .map(|entry| entry.data)
            .filter(|&other| !visited[other])
            .collect();

        let total = seed.count
            + neighbours
                .iter()
                .map(|&other| finer[other].count)
                .sum::<usize>();

        for &other in &neighbours {
            visited[other] = true;
        }

        if neighbours.is_empty() || total < pass.min_points {
            parents[slot] = coarser.len();
            coarser.push(seed);
            for &other in &neighbours {
                parents[other] = coarser.len();
                coarser.push(finer[other]);
            }
            continue;
        }

        let target = coarser.len();
        let mut wx = seed.x * seed.count as f64;
        let mut wy = seed.y * seed.count as f64;
        let mut children = Vec::with_capacity(neighbours.len() + 1);
        parents[slot] = target;
        children.push(seed);

        for &other in &neighbours {
            let node = finer[other];
            wx += node.x * node.count as f64;
            wy += node.y * node.count as f64;
            parents[other] = target;
            children.push(node);
        }

        let id = *next_id;
        *next_id += 1;

        clusters.insert(
            id,
            ClusterRecord {
                count: total,
                zoom: pass.zoom,
                children,
            },
        );
        coarser.push(Node {
            x: wx / total as f64,
            y: wy / total as f64,
            count: total,
            kind: NodeKind::Cluster(id),
        });
    }

    Folded {
        nodes: coarser,
        parents,
    }
}
