//! Diagnostic bookkeeping about obligation cubes. Nothing here feeds back
//! into the algorithm.

use std::collections::HashMap;
use std::fmt::Write as _;

use crate::cube::{Cube, Lit};

/// How often each obligation cube was produced.
#[derive(Debug, Default)]
pub struct CubeTable {
    counts: HashMap<Vec<Lit>, usize>,
}

impl CubeTable {
    /// Insert-or-increment. Returns the updated count.
    pub fn update(&mut self, cube: &Cube) -> usize {
        let count = self.counts.entry(cube.lits().to_vec()).or_insert(0);
        *count += 1;
        *count
    }

    pub fn count(&self, cube: &Cube) -> usize {
        self.counts.get(cube.lits()).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Cubes seen more than once, most frequent first.
    pub fn repeated(&self) -> Vec<(&[Lit], usize)> {
        let mut out: Vec<(&[Lit], usize)> = self
            .counts
            .iter()
            .filter(|(_, &n)| n > 1)
            .map(|(k, &n)| (k.as_slice(), n))
            .collect();
        out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        out
    }
}

#[derive(Debug, Clone)]
pub struct LineageNode {
    pub lits: Vec<Lit>,
    /// The cube this one was derived to block.
    pub successor: Option<usize>,
    /// Cubes derived while blocking this one.
    pub predecessors: Vec<usize>,
}

/// Forest of obligation cubes linked to the cube each helped block.
#[derive(Debug, Default)]
pub struct LineageTree {
    nodes: Vec<LineageNode>,
    index: HashMap<Vec<Lit>, usize>,
}

impl LineageTree {
    /// Record `cube` as derived from `successor`. A cube already present
    /// keeps its first successor.
    pub fn insert(&mut self, cube: &Cube, successor: Option<&Cube>) -> usize {
        if let Some(&id) = self.index.get(cube.lits()) {
            return id;
        }
        let succ = successor.and_then(|s| self.index.get(s.lits()).copied());
        let id = self.nodes.len();
        self.nodes.push(LineageNode { lits: cube.lits().to_vec(), successor: succ, predecessors: Vec::new() });
        self.index.insert(cube.lits().to_vec(), id);
        if let Some(s) = succ {
            self.nodes[s].predecessors.push(id);
        }
        id
    }

    pub fn find(&self, cube: &Cube) -> Option<usize> {
        self.index.get(cube.lits()).copied()
    }

    pub fn node(&self, id: usize) -> &LineageNode {
        &self.nodes[id]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn roots(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.nodes.len()).filter(|&i| self.nodes[i].successor.is_none())
    }

    /// Links from `id` up to its root.
    pub fn depth(&self, id: usize) -> usize {
        let mut depth = 0;
        let mut cur = id;
        while let Some(s) = self.nodes[cur].successor {
            depth += 1;
            cur = s;
        }
        depth
    }

    /// One line per node, indented by depth, as register patterns.
    pub fn render(&self, num_regs: usize) -> String {
        let mut out = String::new();
        let mut stack: Vec<(usize, usize)> = self.roots().map(|r| (r, 0)).collect();
        stack.reverse();
        while let Some((id, depth)) = stack.pop() {
            let node = &self.nodes[id];
            let _ = writeln!(out, "{}{}", "  ".repeat(depth), pattern(&node.lits, num_regs));
            stack.extend(node.predecessors.iter().rev().map(|&p| (p, depth + 1)));
        }
        out
    }
}

fn pattern(lits: &[Lit], num_regs: usize) -> String {
    let mut chars = vec!['-'; num_regs];
    for l in lits {
        chars[l.var()] = if l.is_compl() { '0' } else { '1' };
    }
    chars.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cube(lits: &[(usize, bool)]) -> Cube {
        Cube::new(lits.iter().map(|&(v, b)| Lit::new(v, b)).collect(), &[])
    }

    #[test]
    fn table_counts_by_content() {
        let mut t = CubeTable::default();
        let a = cube(&[(0, true)]);
        assert_eq!(t.update(&a), 1);
        assert_eq!(t.update(&a.dup()), 2);
        assert_eq!(t.update(&cube(&[(1, true)])), 1);
        assert_eq!(t.len(), 2);
        assert_eq!(t.repeated(), vec![(a.lits(), 2)]);
    }

    #[test]
    fn tree_links_successors_and_renders() {
        let mut tree = LineageTree::default();
        let bad = cube(&[(0, true), (1, true)]);
        let p1 = cube(&[(0, false), (1, true)]);
        let p2 = cube(&[(1, false)]);
        let root = tree.insert(&bad, None);
        let a = tree.insert(&p1, Some(&bad));
        let b = tree.insert(&p2, Some(&p1));
        assert_eq!(tree.insert(&p2, Some(&bad)), b);
        assert_eq!(tree.node(a).successor, Some(root));
        assert_eq!(tree.node(root).predecessors, vec![a]);
        assert_eq!(tree.depth(b), 2);
        assert_eq!(tree.roots().collect::<Vec<_>>(), vec![root]);
        assert_eq!(tree.render(2), "11\n  01\n    -0\n");
    }

    #[test]
    fn deep_lineage_renders_iteratively() {
        let mut tree = LineageTree::default();
        let mut prev = cube(&[(0, true)]);
        tree.insert(&prev, None);
        for i in 1..2_000 {
            let next = Cube::new(vec![Lit::new(i, true)], &[]);
            tree.insert(&next, Some(&prev));
            prev = next;
        }
        let last = tree.find(&prev).unwrap();
        assert_eq!(tree.depth(last), 1_999);
        assert_eq!(tree.render(2_000).lines().count(), 2_000);
    }
}
