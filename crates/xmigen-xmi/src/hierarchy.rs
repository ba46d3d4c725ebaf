//! Containment hierarchy construction and traversal
//!
//! Folds aggregation edges into their containers and offers a read-only
//! parent/child view over the folded table.

use std::collections::{HashMap, HashSet, VecDeque};
use xmigen_core::{AggregationEdge, ChildRef, ClassTable, Multiplicity};

/// Fold aggregation edges into each container's children list
///
/// Edges naming an unknown target or source are dropped, so every
/// resulting [`ChildRef`] resolves in the returned table.
pub fn attach_children(mut classes: ClassTable, edges: &[AggregationEdge]) -> ClassTable {
    for edge in edges {
        if !classes.contains(&edge.source) {
            tracing::debug!(source = %edge.source, target = %edge.target, "dropping aggregation with unknown source");
            continue;
        }

        let Some(container) = classes.get_mut(&edge.target) else {
            tracing::debug!(source = %edge.source, target = %edge.target, "dropping aggregation with unknown target");
            continue;
        };

        container.children.push(ChildRef::new(
            edge.source.clone(),
            Multiplicity::parse(&edge.target_multiplicity),
        ));
    }

    classes
}

/// One line of a containment outline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineNode {
    /// Nesting depth (root is 0)
    pub depth: usize,

    /// Class name
    pub class: String,

    /// Multiplicity under the parent (`None` for the start node)
    pub multiplicity: Option<Multiplicity>,

    /// Whether this node closes a cycle and was not expanded
    pub cyclic: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VisitState {
    OnPath,
    Done,
}

/// Parent/child view over a folded class table
#[derive(Debug, Clone)]
pub struct ContainmentTree<'a> {
    classes: &'a ClassTable,

    /// Reverse edges: class -> containers, in declaration order
    parents: HashMap<&'a str, Vec<&'a str>>,
}

impl<'a> ContainmentTree<'a> {
    /// Build the view for a table whose children are already attached
    pub fn new(classes: &'a ClassTable) -> Self {
        let mut parents: HashMap<&'a str, Vec<&'a str>> = HashMap::new();

        for class in classes.iter() {
            for child in &class.children {
                parents
                    .entry(child.class.as_str())
                    .or_default()
                    .push(class.name.as_str());
            }
        }

        Self { classes, parents }
    }

    /// Immediate children of a class
    pub fn children(&self, name: &str) -> Vec<&'a str> {
        self.classes
            .get(name)
            .map(|class| class.children.iter().map(|c| c.class.as_str()).collect())
            .unwrap_or_default()
    }

    /// Immediate containers of a class
    pub fn parents(&self, name: &str) -> Vec<&'a str> {
        self.parents.get(name).cloned().unwrap_or_default()
    }

    /// All classes nested beneath a class, breadth-first
    pub fn descendants(&self, name: &str) -> Vec<&'a str> {
        self.breadth_first(name, |n| self.children(n))
    }

    /// All classes a class is nested in, breadth-first
    pub fn ancestors(&self, name: &str) -> Vec<&'a str> {
        self.breadth_first(name, |n| self.parents(n))
    }

    fn breadth_first<F>(&self, start: &str, next: F) -> Vec<&'a str>
    where
        F: Fn(&str) -> Vec<&'a str>,
    {
        let mut visited = HashSet::new();
        let mut queue: VecDeque<&'a str> = next(start).into_iter().collect();
        let mut result = Vec::new();

        while let Some(current) = queue.pop_front() {
            if !visited.insert(current) {
                continue;
            }
            result.push(current);

            for following in next(current) {
                if !visited.contains(following) {
                    queue.push_back(following);
                }
            }
        }

        result
    }

    /// Classes that cannot be reached from the root, in declaration order
    ///
    /// Empty when there is no root.
    pub fn unreachable(&self) -> Vec<&'a str> {
        let Some(root) = self.classes.root() else {
            return Vec::new();
        };

        let mut reachable: HashSet<&str> = self.descendants(&root.name).into_iter().collect();
        reachable.insert(root.name.as_str());

        self.classes
            .iter()
            .map(|class| class.name.as_str())
            .filter(|name| !reachable.contains(name))
            .collect()
    }

    /// Find a containment cycle, returned as the path that closes it
    ///
    /// The first and last element of the path are the same class.
    pub fn find_cycle(&self) -> Option<Vec<String>> {
        let mut state: HashMap<&'a str, VisitState> = HashMap::new();

        for class in self.classes.iter() {
            let start = class.name.as_str();
            if state.contains_key(start) {
                continue;
            }

            // (class, index of the next child to visit)
            let mut stack: Vec<(&'a str, usize)> = vec![(start, 0)];
            state.insert(start, VisitState::OnPath);

            while let Some(&(name, index)) = stack.last() {
                let Some(&child) = self.children(name).get(index) else {
                    state.insert(name, VisitState::Done);
                    stack.pop();
                    continue;
                };

                if let Some(top) = stack.last_mut() {
                    top.1 += 1;
                }

                match state.get(child) {
                    Some(VisitState::OnPath) => {
                        let from = stack.iter().position(|(n, _)| *n == child).unwrap_or(0);
                        let mut path: Vec<String> =
                            stack[from..].iter().map(|(n, _)| n.to_string()).collect();
                        path.push(child.to_string());
                        return Some(path);
                    }
                    Some(VisitState::Done) => {}
                    None => {
                        state.insert(child, VisitState::OnPath);
                        stack.push((child, 0));
                    }
                }
            }
        }

        None
    }

    /// Pre-order outline of the containment tree below `start`
    ///
    /// A class already on the current path is listed once more, marked
    /// cyclic, and not expanded.
    pub fn outline(&self, start: &'a str) -> Vec<OutlineNode> {
        let mut nodes = Vec::new();
        // Open classes with the index of the next child to list
        let mut path: Vec<(&'a str, usize)> = Vec::new();

        nodes.push(OutlineNode {
            depth: 0,
            class: start.to_string(),
            multiplicity: None,
            cyclic: false,
        });
        if self.classes.contains(start) {
            path.push((start, 0));
        }

        while let Some(&(name, index)) = path.last() {
            let Some(child) = self.classes.get(name).and_then(|class| class.children.get(index)) else {
                path.pop();
                continue;
            };
            if let Some(top) = path.last_mut() {
                top.1 += 1;
            }

            let cyclic = path.iter().any(|(open, _)| *open == child.class);
            nodes.push(OutlineNode {
                depth: path.len(),
                class: child.class.clone(),
                multiplicity: Some(child.multiplicity.clone()),
                cyclic,
            });

            if !cyclic && self.classes.contains(&child.class) {
                path.push((child.class.as_str(), 0));
            }
        }

        nodes
    }
}
