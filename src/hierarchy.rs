//! Parent/child tree assembly for WBS views.

use std::collections::HashMap;

use serde::Serialize;

use crate::error::ScheduleResult;
use crate::service::SchedulingService;
use crate::store::ScheduleStore;
use crate::task::{TaskId, TaskView};

/// A task with its depth in the WBS and its direct children.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeNode {
    #[serde(flatten)]
    pub task: TaskView,
    pub level: usize,
    pub children: Vec<TreeNode>,
}

/// Assemble a flat task list into a forest.
///
/// Siblings keep their input order. A task whose parent is not in `tasks`
/// becomes a root. Levels are always recomputed from the roots.
pub fn build_hierarchy(tasks: &[TaskView]) -> Vec<TreeNode> {
    let index: HashMap<TaskId, usize> = tasks
        .iter()
        .enumerate()
        .map(|(i, t)| (t.id(), i))
        .collect();

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); tasks.len()];
    let mut roots = Vec::new();
    for (i, t) in tasks.iter().enumerate() {
        match t.task.parent_task_id.and_then(|p| index.get(&p)) {
            Some(&p) if p != i => children[p].push(i),
            _ => roots.push(i),
        }
    }

    roots
        .into_iter()
        .map(|i| attach(i, 0, tasks, &children))
        .collect()
}

fn attach(i: usize, level: usize, tasks: &[TaskView], children: &[Vec<usize>]) -> TreeNode {
    TreeNode {
        task: tasks[i].clone(),
        level,
        children: children[i]
            .iter()
            .map(|&c| attach(c, level + 1, tasks, children))
            .collect(),
    }
}

/// Depth of every task reachable from the given roots.
pub fn level_map(nodes: &[TreeNode]) -> HashMap<TaskId, usize> {
    let mut levels = HashMap::new();
    for (task, level) in depth_first(nodes) {
        levels.insert(task.id(), level);
    }
    levels
}

/// Pre-order walk of the forest, yielding each task with its level.
pub fn depth_first(nodes: &[TreeNode]) -> Vec<(&TaskView, usize)> {
    fn walk<'a>(nodes: &'a [TreeNode], out: &mut Vec<(&'a TaskView, usize)>) {
        for node in nodes {
            out.push((&node.task, node.level));
            walk(&node.children, out);
        }
    }
    let mut out = Vec::new();
    walk(nodes, &mut out);
    out
}

impl<S: ScheduleStore> SchedulingService<S> {
    /// All tasks of a project as a WBS forest.
    pub fn hierarchy(&self, project_id: &str) -> ScheduleResult<Vec<TreeNode>> {
        let tasks = self.tasks(project_id)?;
        Ok(build_hierarchy(&tasks))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::view;

    #[test]
    fn test_levels_and_children() {
        let a = view("A", 0, None);
        let b = view("B", 0, Some(a.id()));
        let c = view("C", 0, Some(b.id()));
        let d = view("D", 1, None);
        let tasks = vec![a.clone(), b.clone(), c.clone(), d.clone()];

        let forest = build_hierarchy(&tasks);
        assert_eq!(forest.len(), 2);
        assert_eq!(forest[0].task.id(), a.id());
        assert_eq!(forest[0].children[0].task.id(), b.id());
        assert_eq!(forest[0].children[0].children[0].level, 2);
        assert_eq!(forest[1].level, 0);

        let levels = level_map(&forest);
        assert_eq!(levels[&c.id()], 2);
        assert_eq!(levels[&d.id()], 0);
    }

    #[test]
    fn test_dangling_parent_becomes_root() {
        let orphan = view("orphan", 0, Some(uuid::Uuid::new_v4()));
        let forest = build_hierarchy(&[orphan.clone()]);
        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].task.id(), orphan.id());
        assert_eq!(forest[0].level, 0);
    }

    #[test]
    fn test_child_listed_before_parent() {
        let parent = view("parent", 0, None);
        let child = view("child", 0, Some(parent.id()));
        let forest = build_hierarchy(&[child.clone(), parent.clone()]);
        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].children[0].task.id(), child.id());
        assert_eq!(forest[0].children[0].level, 1);
    }

    #[test]
    fn test_deterministic() {
        let a = view("A", 0, None);
        let b = view("B", 0, Some(a.id()));
        let c = view("C", 1, Some(a.id()));
        let tasks = vec![a, b, c];
        assert_eq!(build_hierarchy(&tasks), build_hierarchy(&tasks));
    }

    #[test]
    fn test_depth_first_order() {
        let a = view("A", 0, None);
        let b = view("B", 1, None);
        let a1 = view("A1", 0, Some(a.id()));
        let forest = build_hierarchy(&[a, b, a1]);
        let names: Vec<_> = depth_first(&forest)
            .into_iter()
            .map(|(t, l)| (t.task.name.clone(), l))
            .collect();
        assert_eq!(
            names,
            vec![("A".to_string(), 0), ("A1".to_string(), 1), ("B".to_string(), 0)]
        );
    }
}
