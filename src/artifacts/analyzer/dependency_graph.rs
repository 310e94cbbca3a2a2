//! Cross-asset dependency graph
//!
//! Built from the [`AssetInfo`]s of many files. Dependency targets are package
//! paths (`/Game/X/Y`); they resolve to analyzed files through the
//! `Content/X/Y.<ext>` convention. Targets with no analyzed file stay dangling
//! and take no part in cycle detection.
//!
//! Cycles are the strongly connected components of the resolved graph, found
//! with an iterative Tarjan walk. Every edge whose endpoints share a cycle is
//! flagged `circular`.

use crate::artifacts::analyzer::AssetInfo;
use crate::artifacts::analyzer::dependency::AssetDependency;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    assets: BTreeMap<String, AssetInfo>,
    packages: HashMap<String, String>,
    cycles: Vec<Vec<String>>,
}

impl DependencyGraph {
    pub fn build(infos: impl IntoIterator<Item = AssetInfo>) -> Self {
        let mut graph = DependencyGraph::default();

        for info in infos {
            if let Some(package) = info.package_path() {
                graph.packages.insert(package, info.path.clone());
            }
            graph.assets.insert(info.path.clone(), info);
        }

        graph.mark_cycles();
        graph
    }

    /// File path of the analyzed asset a package path refers to.
    pub fn resolve(&self, package: &str) -> Option<&str> {
        self.packages.get(package).map(String::as_str)
    }

    pub fn asset(&self, path: &str) -> Option<&AssetInfo> {
        self.assets.get(path)
    }

    pub fn assets(&self) -> impl Iterator<Item = &AssetInfo> {
        self.assets.values()
    }

    pub fn dependencies_of(&self, path: &str) -> &[AssetDependency] {
        self.assets
            .get(path)
            .map(|info| info.dependencies.as_slice())
            .unwrap_or_default()
    }

    /// File paths of assets that depend on `path`, sorted.
    pub fn dependents_of(&self, path: &str) -> Vec<&str> {
        let Some(package) = self.assets.get(path).and_then(AssetInfo::package_path) else {
            return Vec::new();
        };

        self.assets
            .values()
            .filter(|info| info.path != path)
            .filter(|info| info.dependencies.iter().any(|dependency| dependency.target == package))
            .map(|info| info.path.as_str())
            .collect()
    }

    /// Each dependency cycle as the sorted file paths it passes through.
    pub fn cycles(&self) -> &[Vec<String>] {
        &self.cycles
    }

    pub fn has_cycles(&self) -> bool {
        !self.cycles.is_empty()
    }

    fn mark_cycles(&mut self) {
        let nodes = self.assets.keys().cloned().collect::<Vec<_>>();
        let node_index = nodes
            .iter()
            .enumerate()
            .map(|(i, path)| (path.as_str(), i))
            .collect::<HashMap<_, _>>();

        let adjacency = nodes
            .iter()
            .map(|path| {
                self.dependencies_of(path)
                    .iter()
                    .filter_map(|dependency| self.resolve(&dependency.target))
                    .filter_map(|target| node_index.get(target).copied())
                    .collect::<Vec<_>>()
            })
            .collect::<Vec<_>>();

        let component = strongly_connected_components(&adjacency);

        let mut members: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (node, &c) in component.iter().enumerate() {
            members.entry(c).or_default().push(node);
        }
        let cyclic = |node: usize| {
            members.get(&component[node]).is_some_and(|m| m.len() > 1) || adjacency[node].contains(&node)
        };

        self.cycles = members
            .values()
            .filter(|m| m.first().is_some_and(|&node| cyclic(node)))
            .map(|m| m.iter().map(|&node| nodes[node].clone()).collect())
            .collect();

        let circular_targets = nodes
            .iter()
            .enumerate()
            .map(|(source, path)| {
                let targets = adjacency[source]
                    .iter()
                    .filter(|&&target| component[target] == component[source] && cyclic(source))
                    .map(|&target| nodes[target].clone())
                    .collect::<Vec<_>>();
                (path.clone(), targets)
            })
            .collect::<Vec<_>>();

        for (path, targets) in circular_targets {
            let packages = &self.packages;
            if let Some(info) = self.assets.get_mut(&path) {
                for dependency in &mut info.dependencies {
                    let resolved = packages.get(&dependency.target);
                    dependency.circular = resolved.is_some_and(|file| targets.contains(file));
                }
            }
        }
    }
}

/// Component id per node, computed without recursion.
fn strongly_connected_components(adjacency: &[Vec<usize>]) -> Vec<usize> {
    let n = adjacency.len();
    let mut index = vec![None; n];
    let mut low = vec![0usize; n];
    let mut on_stack = vec![false; n];
    let mut stack = Vec::new();
    let mut component = vec![0usize; n];
    let mut next_index = 0;
    let mut next_component = 0;

    for root in 0..n {
        if index[root].is_some() {
            continue;
        }

        let mut frames = vec![(root, 0usize)];
        index[root] = Some(next_index);
        low[root] = next_index;
        next_index += 1;
        stack.push(root);
        on_stack[root] = true;

        while let Some(frame) = frames.last_mut() {
            let node = frame.0;

            if let Some(&next) = adjacency[node].get(frame.1) {
                frame.1 += 1;
                match index[next] {
                    None => {
                        index[next] = Some(next_index);
                        low[next] = next_index;
                        next_index += 1;
                        stack.push(next);
                        on_stack[next] = true;
                        frames.push((next, 0));
                    }
                    Some(next_idx) if on_stack[next] => low[node] = low[node].min(next_idx),
                    Some(_) => {}
                }
                continue;
            }

            frames.pop();
            if let Some(&(parent, _)) = frames.last() {
                low[parent] = low[parent].min(low[node]);
            }

            if Some(low[node]) == index[node] {
                while let Some(member) = stack.pop() {
                    on_stack[member] = false;
                    component[member] = next_component;
                    if member == node {
                        break;
                    }
                }
                next_component += 1;
            }
        }
    }

    component
}
