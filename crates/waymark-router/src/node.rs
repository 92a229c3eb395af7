//! Segment tree node.
//!
//! Each node stands for one path segment. Literal children are kept sorted
//! for binary search; a node has at most one parameter child, shared by every
//! template that places a placeholder at that position.

use smallvec::SmallVec;

use crate::method_table::MethodTable;
use crate::template::Segment;

/// Positions of the request segments bound to placeholders, in path order.
pub(crate) type Bindings = SmallVec<[usize; 4]>;

/// A terminal node reached by a request path, with the positions it bound.
#[derive(Debug)]
pub(crate) struct Candidate<'a> {
    pub(crate) node: &'a Node,
    pub(crate) bound: Bindings,
}

/// A node in the segment tree.
#[derive(Debug, Clone, Default)]
pub struct Node {
    /// Literal text for static nodes, empty for the root and parameter nodes.
    segment: String,

    /// Routes terminating at this node.
    methods: MethodTable,

    /// Literal children, sorted by segment.
    static_children: Vec<Node>,

    /// Placeholder child.
    param_child: Option<Box<Node>>,
}

impl Node {
    /// Creates the root node.
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    fn new_static(segment: &str) -> Self {
        Self {
            segment: segment.to_string(),
            ..Self::default()
        }
    }

    /// Returns the literal text of this node.
    #[must_use]
    pub fn segment(&self) -> &str {
        &self.segment
    }

    /// Returns the routes terminating at this node.
    #[must_use]
    pub fn methods(&self) -> &MethodTable {
        &self.methods
    }

    /// Walks (creating as needed) the node for `segments`.
    pub(crate) fn descend_mut(&mut self, segments: &[Segment]) -> &mut Self {
        let Some((first, rest)) = segments.split_first() else {
            return self;
        };

        let child = match first {
            Segment::Literal(text) => {
                let index = match self
                    .static_children
                    .binary_search_by(|c| c.segment.as_str().cmp(text))
                {
                    Ok(index) => index,
                    Err(index) => {
                        self.static_children.insert(index, Node::new_static(text));
                        index
                    }
                };
                &mut self.static_children[index]
            }
            Segment::Param(_) => self
                .param_child
                .get_or_insert_with(|| Box::new(Node::root()))
                .as_mut(),
        };
        child.descend_mut(rest)
    }

    pub(crate) fn methods_mut(&mut self) -> &mut MethodTable {
        &mut self.methods
    }

    /// Collects terminal nodes reachable by `segments` in priority order.
    ///
    /// Literal children are explored before the parameter child, so the first
    /// candidate is the one with the longest literal prefix. Returns `true`
    /// once `first_only` is set and a candidate was found.
    pub(crate) fn collect<'a>(
        &'a self,
        segments: &[String],
        depth: usize,
        allow_empty: bool,
        bound: &mut Bindings,
        first_only: bool,
        out: &mut Vec<Candidate<'a>>,
    ) -> bool {
        let Some(segment) = segments.get(depth) else {
            if self.methods.is_empty() {
                return false;
            }
            out.push(Candidate {
                node: self,
                bound: bound.clone(),
            });
            return first_only;
        };

        if let Some(child) = self.find_static_child(segment) {
            if child.collect(segments, depth + 1, allow_empty, bound, first_only, out) {
                return true;
            }
        }

        if let Some(child) = &self.param_child {
            if allow_empty || !segment.is_empty() {
                bound.push(depth);
                let done = child.collect(segments, depth + 1, allow_empty, bound, first_only, out);
                bound.pop();
                if done {
                    return true;
                }
            }
        }

        false
    }

    fn find_static_child(&self, segment: &str) -> Option<&Node> {
        self.static_children
            .binary_search_by(|c| c.segment.as_str().cmp(segment))
            .ok()
            .map(|i| &self.static_children[i])
    }

    /// Counts the nodes in this subtree, including `self`.
    #[must_use]
    pub fn node_count(&self) -> usize {
        1 + self
            .static_children
            .iter()
            .map(Node::node_count)
            .sum::<usize>()
            + self.param_child.as_ref().map_or(0, |c| c.node_count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::method_table::RouteEntry;
    use crate::template::PathTemplate;
    use http::Method;

    fn insert(root: &mut Node, template: &str, method: Method, op: &str) {
        let template = PathTemplate::parse(template).unwrap();
        let names = template.param_names().map(str::to_string).collect::<Vec<_>>();
        root.descend_mut(template.segments())
            .methods_mut()
            .insert(method, RouteEntry::new(op, template.as_str(), names))
            .unwrap();
    }

    fn segments(path: &[&str]) -> Vec<String> {
        path.iter().map(|s| (*s).to_string()).collect()
    }

    fn ops<'a>(candidates: &[Candidate<'a>]) -> Vec<&'a str> {
        candidates
            .iter()
            .map(|c| c.node.methods().get_operation(&Method::GET).unwrap_or("-"))
            .collect()
    }

    #[test]
    fn test_static_children_stay_sorted() {
        let mut root = Node::root();
        insert(&mut root, "/zebras", Method::GET, "z");
        insert(&mut root, "/ants", Method::GET, "a");
        insert(&mut root, "/moles", Method::GET, "m");

        let order: Vec<_> = root.static_children.iter().map(Node::segment).collect();
        assert_eq!(order, vec!["ants", "moles", "zebras"]);
    }

    #[test]
    fn test_collect_prefers_static() {
        let mut root = Node::root();
        insert(&mut root, "/pets/{id}", Method::GET, "showPet");
        insert(&mut root, "/pets/mine", Method::GET, "myPets");

        let mut out = Vec::new();
        root.collect(&segments(&["pets", "mine"]), 0, false, &mut Bindings::new(), false, &mut out);
        assert_eq!(ops(&out), vec!["myPets", "showPet"]);
        assert!(out[0].bound.is_empty());
        assert_eq!(out[1].bound.as_slice(), &[1]);
    }

    #[test]
    fn test_collect_backtracks_without_leaking_bindings() {
        let mut root = Node::root();
        insert(&mut root, "/{kind}/list", Method::GET, "listKind");
        insert(&mut root, "/{kind}/{id}/edit", Method::GET, "editKind");

        let mut out = Vec::new();
        root.collect(
            &segments(&["pets", "7", "edit"]),
            0,
            false,
            &mut Bindings::new(),
            true,
            &mut out,
        );
        assert_eq!(ops(&out), vec!["editKind"]);
        assert_eq!(out[0].bound.as_slice(), &[0, 1]);
    }

    #[test]
    fn test_collect_skips_empty_segment_for_params() {
        let mut root = Node::root();
        insert(&mut root, "/pets/{id}", Method::GET, "showPet");

        let mut out = Vec::new();
        root.collect(&segments(&["pets", ""]), 0, false, &mut Bindings::new(), false, &mut out);
        assert!(out.is_empty());

        root.collect(&segments(&["pets", ""]), 0, true, &mut Bindings::new(), false, &mut out);
        assert_eq!(ops(&out), vec!["showPet"]);
    }

    #[test]
    fn test_intermediate_nodes_are_not_terminal() {
        let mut root = Node::root();
        insert(&mut root, "/api/v1/pets", Method::GET, "listPets");

        let mut out = Vec::new();
        root.collect(&segments(&["api", "v1"]), 0, false, &mut Bindings::new(), false, &mut out);
        assert!(out.is_empty());
        assert_eq!(root.node_count(), 4);
    }
}
