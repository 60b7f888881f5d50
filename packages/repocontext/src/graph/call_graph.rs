//! Repository-wide call graph: adjacency maps, path/depth queries,
//! cycle-safe traversal.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::model::{CallRelation, FileContext};

/// Aggregate statistics over the whole call graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallGraphStatistics {
    pub total_functions: usize,
    pub total_call_relations: usize,
    pub max_call_depth: usize,
}

/// Two adjacency maps keyed by function name, plus the set of every
/// name known to the graph (defined functions and callee names seen).
#[derive(Debug, Default)]
pub struct CallGraph {
    callers_of: HashMap<String, Vec<CallRelation>>,
    callees_of: HashMap<String, Vec<CallRelation>>,
    known_functions: HashSet<String>,
}

impl CallGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the graph from a full set of parsed files.
    pub fn build_from_files(files: &[FileContext]) -> Self {
        let mut graph = Self::new();

        for fc in files {
            for f in &fc.functions {
                graph.known_functions.insert(f.name.clone());
            }
        }

        for fc in files {
            for f in &fc.functions {
                for site in f.resolved_call_sites() {
                    let relation = CallRelation {
                        caller: f.name.clone(),
                        callee: site.name.clone(),
                        file: fc.path.clone(),
                        line: site.line,
                        caller_file: fc.path.clone(),
                    };
                    graph.known_functions.insert(site.name.clone());
                    graph.callees_of.entry(f.name.clone()).or_default().push(relation.clone());
                    graph.callers_of.entry(site.name).or_default().push(relation);
                }
            }
        }

        graph
    }

    /// Defensive copy of every relation where `name` is the callee.
    pub fn get_callers(&self, name: &str) -> Vec<CallRelation> {
        self.callers_of.get(name).cloned().unwrap_or_default()
    }

    /// Defensive copy of every relation where `name` is the caller.
    pub fn get_callees(&self, name: &str) -> Vec<CallRelation> {
        self.callees_of.get(name).cloned().unwrap_or_default()
    }

    pub fn known_functions(&self) -> &HashSet<String> {
        &self.known_functions
    }

    /// BFS shortest-hop distance from `a` to `b` following `callees_of`;
    /// `None` if there is no path. `a == b` returns `Some(0)`.
    pub fn get_call_chain_depth(&self, a: &str, b: &str) -> Option<u32> {
        if a == b {
            return Some(0);
        }
        let mut visited: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<(&str, u32)> = VecDeque::new();
        queue.push_back((a, 0));
        visited.insert(a);

        while let Some((current, depth)) = queue.pop_front() {
            for relation in self.callees_of.get(current).into_iter().flatten() {
                let callee = relation.callee.as_str();
                if callee == b {
                    return Some(depth + 1);
                }
                if visited.insert(callee) {
                    queue.push_back((callee, depth + 1));
                }
            }
        }
        None
    }

    /// BFS shortest function-name path from `a` to `b`, inclusive of both
    /// endpoints; empty when no path exists.
    pub fn get_call_path(&self, a: &str, b: &str) -> Vec<String> {
        if a == b {
            return vec![a.to_string()];
        }

        let mut visited: HashSet<String> = HashSet::new();
        let mut parent: HashMap<String, String> = HashMap::new();
        let mut queue: VecDeque<String> = VecDeque::new();
        queue.push_back(a.to_string());
        visited.insert(a.to_string());

        let mut found = false;
        while let Some(current) = queue.pop_front() {
            if current == b {
                found = true;
                break;
            }
            for relation in self.callees_of.get(&current).into_iter().flatten() {
                if visited.insert(relation.callee.clone()) {
                    parent.insert(relation.callee.clone(), current.clone());
                    queue.push_back(relation.callee.clone());
                }
            }
        }

        if !found && !visited.contains(b) {
            return Vec::new();
        }

        let mut path = vec![b.to_string()];
        let mut current = b.to_string();
        while let Some(p) = parent.get(&current) {
            path.push(p.clone());
            current = p.clone();
            if current == a {
                break;
            }
        }
        path.reverse();
        if path.first().map(String::as_str) != Some(a) {
            return Vec::new();
        }
        path
    }

    /// `total_functions`, `total_call_relations`, and `max_call_depth`
    /// (the largest cycle-safe DFS depth from any node).
    pub fn statistics(&self) -> CallGraphStatistics {
        let total_functions = self.known_functions.len();
        let total_call_relations = self.callees_of.values().map(Vec::len).sum();

        let mut max_depth = 0usize;
        for name in self.known_functions.iter() {
            let mut in_progress: HashSet<&str> = HashSet::new();
            let depth = self.dfs_depth(name, &mut in_progress);
            max_depth = max_depth.max(depth);
        }

        CallGraphStatistics {
            total_functions,
            total_call_relations,
            max_call_depth: max_depth,
        }
    }

    /// Cycle-safe DFS: marks the current node on entry, unmarks on exit,
    /// so alternative branches remain explorable but cycles cannot cause
    /// unbounded recursion.
    fn dfs_depth<'a>(&'a self, name: &'a str, in_progress: &mut HashSet<&'a str>) -> usize {
        if !in_progress.insert(name) {
            return 0;
        }

        let mut max_child_depth = 0usize;
        for relation in self.callees_of.get(name).into_iter().flatten() {
            let child_depth = self.dfs_depth(relation.callee.as_str(), in_progress);
            max_child_depth = max_child_depth.max(child_depth + 1);
        }

        in_progress.remove(name);
        max_child_depth
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Function;

    fn file_with(path: &str, functions: Vec<Function>) -> FileContext {
        let mut fc = FileContext::new(path, "go", "deadbeef");
        fc.functions = functions;
        fc
    }

    #[test]
    fn build_from_files_populates_adjacency_maps() {
        let mut main_fn = Function::new("main", "func main()", 1, 5);
        main_fn.calls = vec!["createUser".to_string(), "processUser".to_string()];
        let mut process_fn = Function::new("processUser", "func processUser()", 10, 12);
        process_fn.calls = vec!["validateUser".to_string()];
        let create_fn = Function::new("createUser", "func createUser()", 1, 1);
        let validate_fn = Function::new("validateUser", "func validateUser()", 13, 13);

        let files = vec![
            file_with("main.go", vec![main_fn]),
            file_with("user.go", vec![create_fn, process_fn, validate_fn]),
        ];

        let graph = CallGraph::build_from_files(&files);

        assert_eq!(graph.get_callees("main").len(), 2);
        let callers = graph.get_callers("validateUser");
        assert_eq!(callers.len(), 1);
        assert_eq!(callers[0].caller, "processUser");
    }

    #[test]
    fn get_call_chain_depth_counts_hops_and_self_is_zero() {
        let mut a = Function::new("a", "func a()", 1, 1);
        a.calls = vec!["b".to_string()];
        let mut b = Function::new("b", "func b()", 2, 2);
        b.calls = vec!["c".to_string()];
        let c = Function::new("c", "func c()", 3, 3);

        let graph = CallGraph::build_from_files(&[file_with("f.go", vec![a, b, c])]);

        assert_eq!(graph.get_call_chain_depth("a", "a"), Some(0));
        assert_eq!(graph.get_call_chain_depth("a", "b"), Some(1));
        assert_eq!(graph.get_call_chain_depth("a", "c"), Some(2));
        assert_eq!(graph.get_call_chain_depth("c", "a"), None);
    }

    #[test]
    fn get_call_path_reconstructs_shortest_sequence() {
        let mut a = Function::new("a", "func a()", 1, 1);
        a.calls = vec!["b".to_string()];
        let mut b = Function::new("b", "func b()", 2, 2);
        b.calls = vec!["c".to_string()];
        let c = Function::new("c", "func c()", 3, 3);

        let graph = CallGraph::build_from_files(&[file_with("f.go", vec![a, b, c])]);

        assert_eq!(graph.get_call_path("a", "c"), vec!["a", "b", "c"]);
        assert!(graph.get_call_path("c", "a").is_empty());
    }

    #[test]
    fn statistics_counts_functions_and_relations() {
        let mut a = Function::new("a", "func a()", 1, 1);
        a.calls = vec!["b".to_string()];
        let b = Function::new("b", "func b()", 2, 2);

        let graph = CallGraph::build_from_files(&[file_with("f.go", vec![a, b])]);
        let stats = graph.statistics();

        assert_eq!(stats.total_functions, 2);
        assert_eq!(stats.total_call_relations, 1);
        assert_eq!(stats.max_call_depth, 1);
    }

    #[test]
    fn cycle_safe_dfs_terminates_on_self_loop_and_mutual_cycle() {
        let mut a = Function::new("a", "func a()", 1, 1);
        a.calls = vec!["a".to_string()];
        let mut b = Function::new("b", "func b()", 2, 2);
        b.calls = vec!["c".to_string()];
        let mut c = Function::new("c", "func c()", 3, 3);
        c.calls = vec!["b".to_string()];

        let graph = CallGraph::build_from_files(&[file_with("f.go", vec![a, b, c])]);

        // Must terminate and return a finite result for both the
        // self-loop and the mutual two-node cycle.
        let stats = graph.statistics();
        assert!(stats.max_call_depth < 100);
        assert_eq!(graph.get_call_chain_depth("b", "c"), Some(1));
    }

    #[test]
    fn unknown_function_has_empty_callers_and_callees() {
        let graph = CallGraph::new();
        assert!(graph.get_callers("nope").is_empty());
        assert!(graph.get_callees("nope").is_empty());
    }
}
