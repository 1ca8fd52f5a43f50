use std::rc::Rc;

use itertools::Itertools;
use owo_colors::OwoColorize;
use tracing::{debug, trace, warn};

use crate::{
    alphabet::{Symbol, EMPTY},
    automaton::{Delta, Firing, Label, StateId, TmOperation, TransitionId, TM},
    math::OrderedSet,
    stack::Stack,
    Show,
};

use super::{AcceptanceMode, SearchLimits};

/// Handle of an [`IdNode`] inside its [`IdTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of the node in the tree, nodes are numbered in depth first pre-order.
    pub fn index(self) -> usize {
        self.0
    }
}

/// An instantaneous description: one configuration of a Turing machine run. The parent link
/// is only an index, the tree owns all nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdNode {
    state: StateId,
    label: String,
    consumed: usize,
    stack: Stack,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    operation: Option<TmOperation>,
    transition: Option<TransitionId>,
    depth: usize,
    accepted_by_final_state: bool,
    accepted_by_empty_stack: bool,
    active_in_simulation: bool,
}

impl IdNode {
    /// The state of the configuration.
    pub fn state(&self) -> StateId {
        self.state
    }

    /// The label the state had when the tree was built.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Length of the consumed prefix of the input.
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    /// The stack of the configuration.
    pub fn stack(&self) -> &Stack {
        &self.stack
    }

    /// The node this one was derived from, `None` for the root.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// The nodes derived from this one, in the order they were explored.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// The operation that produced this node, `None` for the root.
    pub fn operation(&self) -> Option<&TmOperation> {
        self.operation.as_ref()
    }

    /// The transition whose operation produced this node, `None` for the root.
    pub fn transition(&self) -> Option<TransitionId> {
        self.transition
    }

    /// Distance from the root.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// All input is consumed and the state is final.
    pub fn is_accepted_by_final_state(&self) -> bool {
        self.accepted_by_final_state
    }

    /// All input is consumed and the stack is empty.
    pub fn is_accepted_by_empty_stack(&self) -> bool {
        self.accepted_by_empty_stack
    }

    /// Accepted in the mode the tree was built for.
    pub fn is_accepted(&self) -> bool {
        self.accepted_by_final_state || self.accepted_by_empty_stack
    }

    /// Whether the node lies on the path that is currently displayed.
    pub fn is_active_in_simulation(&self) -> bool {
        self.active_in_simulation
    }
}

/// The tree of all instantaneous descriptions a Turing machine run explored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdTree {
    input: Vec<Symbol>,
    mode: AcceptanceMode,
    nodes: Vec<IdNode>,
    first_accepted: Option<NodeId>,
    truncated: bool,
}

impl IdTree {
    fn new(input: &str, mode: AcceptanceMode) -> Self {
        Self {
            input: input.chars().collect(),
            mode,
            nodes: vec![],
            first_accepted: None,
            truncated: false,
        }
    }

    /// The input the tree was built for.
    pub fn input(&self) -> String {
        self.input.iter().collect()
    }

    /// The acceptance mode the tree was built for.
    pub fn mode(&self) -> AcceptanceMode {
        self.mode
    }

    /// The root, `None` if the machine has no initial state.
    pub fn root(&self) -> Option<NodeId> {
        (!self.nodes.is_empty()).then_some(NodeId(0))
    }

    /// Returns the node with the given handle.
    ///
    /// # Panics
    /// If the handle belongs to a different tree.
    pub fn node(&self, id: NodeId) -> &IdNode {
        &self.nodes[id.0]
    }

    /// Iterates over all nodes in depth first pre-order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &IdNode)> + '_ {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    /// Number of nodes.
    pub fn size(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the tree has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether some explored node is accepted.
    pub fn accepted(&self) -> bool {
        self.first_accepted.is_some()
    }

    /// The first accepted node in depth first order.
    pub fn first_accepted(&self) -> Option<NodeId> {
        self.first_accepted
    }

    /// Whether exploration was cut short by the [`SearchLimits`].
    pub fn truncated(&self) -> bool {
        self.truncated
    }

    /// The input that is left to read in `id`.
    pub fn remaining_input(&self, id: NodeId) -> String {
        self.input[self.node(id).consumed..].iter().collect()
    }

    /// The path from the root to `id`, root first.
    pub fn path_to(&self, id: NodeId) -> Vec<NodeId> {
        let mut path = vec![id];
        let mut current = id;
        while let Some(parent) = self.node(current).parent {
            path.push(parent);
            current = parent;
        }
        path.reverse();
        path
    }

    /// The path to the first accepted node, empty if nothing was accepted. These are the steps
    /// of the simulation.
    pub fn witness(&self) -> Vec<NodeId> {
        self.first_accepted
            .map(|id| self.path_to(id))
            .unwrap_or_default()
    }

    /// Marks exactly the nodes on the path from the root to `id` as active.
    pub fn activate_path(&mut self, id: NodeId) {
        let path: OrderedSet<NodeId> = self.path_to(id).into_iter().collect();
        for (i, node) in self.nodes.iter_mut().enumerate() {
            node.active_in_simulation = path.contains(&NodeId(i));
        }
    }

    /// Clears the active marker of every node.
    pub fn deactivate_all(&mut self) {
        for node in &mut self.nodes {
            node.active_in_simulation = false;
        }
    }

    fn describe(&self, id: NodeId) -> String {
        let node = self.node(id);
        let remaining = self.remaining_input(id);
        let stack = node.stack.show();
        format!(
            "({}, {}, {})",
            node.label,
            if remaining.is_empty() {
                EMPTY.to_string()
            } else {
                remaining
            },
            if stack.is_empty() {
                EMPTY.to_string()
            } else {
                stack
            }
        )
    }
}

impl Show for IdTree {
    /// One line per node in pre-order, indented by depth. Accepted nodes are green and the
    /// active path is bold.
    fn show(&self) -> String {
        self.nodes()
            .map(|(id, node)| {
                let mut line = self.describe(id);
                if let Some(operation) = &node.operation {
                    line = format!("{} ⊢ {line}", operation.show());
                }
                if node.is_accepted() {
                    line = line.green().to_string();
                }
                if node.active_in_simulation {
                    line = line.bold().to_string();
                }
                format!("{}{line}", "  ".repeat(node.depth))
            })
            .join("\n")
    }
}

struct Frame {
    node: NodeId,
    transition: usize,
    operation: usize,
}

impl Frame {
    fn new(node: NodeId) -> Self {
        Self {
            node,
            transition: 0,
            operation: 0,
        }
    }
}

struct Expansion {
    transition: TransitionId,
    operation: TmOperation,
    target: StateId,
    firing: Firing,
}

/// Depth first exploration with an explicit stack of frames. Each frame remembers which
/// transition and operation of its node is tried next.
struct Explorer<'a> {
    tm: &'a TM,
    delta: Rc<Delta<TmOperation>>,
    limits: SearchLimits,
    witness: bool,
    tree: IdTree,
}

impl<'a> Explorer<'a> {
    fn new(tm: &'a TM, input: &str, mode: AcceptanceMode, witness: bool) -> Self {
        Self {
            tm,
            delta: tm.delta(),
            limits: tm.search_limits(),
            witness,
            tree: IdTree::new(input, mode),
        }
    }

    fn truncate(&mut self, reason: &str) {
        if !self.tree.truncated {
            warn!("ID tree exploration truncated: {reason}");
        }
        self.tree.truncated = true;
    }

    fn push_node(&mut self, node: IdNode) -> NodeId {
        let id = NodeId(self.tree.nodes.len());
        self.tree.nodes.push(node);
        id
    }

    /// Flags the node if it is accepted and records it if it is the first one.
    fn evaluate(&mut self, id: NodeId) -> bool {
        let input_len = self.tree.input.len();
        let mode = self.tree.mode;
        let node = &mut self.tree.nodes[id.0];
        if node.consumed < input_len {
            return false;
        }
        match mode {
            AcceptanceMode::FinalState => {
                node.accepted_by_final_state =
                    self.tm.state(node.state).is_some_and(|s| s.is_final())
            }
            AcceptanceMode::EmptyStack => node.accepted_by_empty_stack = node.stack.is_empty(),
        }
        let accepted = node.is_accepted();
        if accepted && self.tree.first_accepted.is_none() {
            debug!(depth = node.depth, "found accepting ID {}", node.label);
            self.tree.first_accepted = Some(id);
        }
        accepted
    }

    fn next_expansion(&self, frame: &mut Frame) -> Option<Expansion> {
        let node = self.tree.node(frame.node);
        let next = self.tree.input.get(node.consumed).copied();
        let outgoing = self.delta.outgoing(node.state);
        while let Some(&id) = outgoing.get(frame.transition) {
            let transition = self
                .tm
                .transition(id)
                .unwrap_or_else(|| panic!("{id:?} is in delta but not in the machine"));
            let Some(operation) = transition.operation(frame.operation) else {
                frame.transition += 1;
                frame.operation = 0;
                continue;
            };
            frame.operation += 1;
            if let Some(firing) = operation.fire(next, &node.stack) {
                return Some(Expansion {
                    transition: id,
                    operation: operation.clone(),
                    target: transition.target(),
                    firing,
                });
            }
        }
        None
    }

    fn explore(mut self) -> IdTree {
        let Some(initial) = self.tm.initial_state() else {
            trace!("no initial state, nothing to explore");
            return self.tree;
        };
        let root = self.push_node(IdNode {
            state: initial,
            label: self.tm.label_of(initial).to_string(),
            consumed: 0,
            stack: Stack::starting_with(self.tm.stack_start()),
            parent: None,
            children: vec![],
            operation: None,
            transition: None,
            depth: 0,
            accepted_by_final_state: false,
            accepted_by_empty_stack: false,
            active_in_simulation: false,
        });
        if self.evaluate(root) && self.witness {
            return self.tree;
        }

        let mut frames = vec![Frame::new(root)];
        while let Some(frame) = frames.last_mut() {
            let parent = frame.node;
            let Some(expansion) = self.next_expansion(frame) else {
                frames.pop();
                continue;
            };

            let depth = self.tree.node(parent).depth + 1;
            if depth > self.limits.max_depth {
                self.truncate("depth limit reached");
                continue;
            }
            if self.tree.size() >= self.limits.max_nodes {
                self.truncate("node limit reached");
                break;
            }

            let consumed = self.tree.node(parent).consumed + usize::from(expansion.firing.consumed);
            trace!(
                depth,
                "{} --{}--> {}",
                self.tree.node(parent).label,
                expansion.operation.show(),
                self.tm.label_of(expansion.target)
            );
            let child = self.push_node(IdNode {
                state: expansion.target,
                label: self.tm.label_of(expansion.target).to_string(),
                consumed,
                stack: expansion.firing.stack,
                parent: Some(parent),
                children: vec![],
                operation: Some(expansion.operation),
                transition: Some(expansion.transition),
                depth,
                accepted_by_final_state: false,
                accepted_by_empty_stack: false,
                active_in_simulation: false,
            });
            self.tree.nodes[parent.0].children.push(child);

            if self.evaluate(child) && self.witness {
                break;
            }
            frames.push(Frame::new(child));
        }
        self.tree
    }
}

impl TM {
    /// Returns true if some run of the machine consumes all of `input` and is accepted in
    /// `mode`. Exploration stops at the first accepted configuration.
    pub fn accepts(&self, input: &str, mode: AcceptanceMode) -> bool {
        self.simulate(input, mode).accepted()
    }

    /// Explores runs on `input` in depth first order until the first accepted configuration
    /// is found. The path leading to it is marked active, see [`IdTree::witness`].
    pub fn simulate(&self, input: &str, mode: AcceptanceMode) -> IdTree {
        let mut tree = Explorer::new(self, input, mode, true).explore();
        if let Some(accepted) = tree.first_accepted() {
            tree.activate_path(accepted);
        }
        tree
    }

    /// Explores every run on `input`, within the search limits, flagging all accepted
    /// configurations.
    pub fn id_tree(&self, input: &str, mode: AcceptanceMode) -> IdTree {
        Explorer::new(self, input, mode, false).explore()
    }

    /// Marks exactly the state of `node` as active, so a consumer can display a step of a
    /// witness path.
    pub fn activate_node(&mut self, node: &IdNode) {
        self.activate_states(&OrderedSet::from([node.state]));
    }
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    fn dollar_loop(final_state: bool) -> TM {
        let mut tm = TM::new();
        let q0 = tm.add_state(State::new("q0").initial());
        tm.set_accepting(q0, final_state).unwrap();
        tm.add_transition(q0, q0, [TmOperation::new('a', '$', StackAction::push("$"))])
            .unwrap();
        tm
    }

    fn guessing(both_final: bool) -> TM {
        let accepting = if both_final { vec![1, 2] } else { vec![2] };
        TM::builder()
            .with_accepting(accepting)
            .with_edges([
                (0, TmOperation::new('a', '$', StackAction::Nothing), 1),
                (0, TmOperation::new('a', '$', StackAction::Nothing), 2),
            ])
            .build(Some(0))
            .unwrap()
    }

    #[test_log::test]
    fn stack_never_empties() {
        assert!(!dollar_loop(true).accepts("aaa", AcceptanceMode::EmptyStack));
        assert!(dollar_loop(true).accepts("", AcceptanceMode::FinalState));
        assert!(!dollar_loop(false).accepts("", AcceptanceMode::FinalState));

        let tree = dollar_loop(false).id_tree("aaa", AcceptanceMode::EmptyStack);
        assert_eq!(tree.size(), 4);
        assert!(!tree.truncated());
        let last = tree.nodes().last().unwrap().1;
        assert_eq!(last.stack().len(), 4);
        assert_eq!(last.consumed(), 3);
    }

    #[test]
    fn no_initial_state_gives_empty_tree() {
        let mut tm = dollar_loop(true);
        tm.set_initial_state(None);
        let tree = tm.id_tree("", AcceptanceMode::FinalState);
        assert!(tree.is_empty());
        assert_eq!(tree.root(), None);
        assert!(!tm.accepts("", AcceptanceMode::FinalState));
    }

    #[test_log::test]
    fn witness_path_skips_dead_branches() {
        let tm = guessing(false);
        let tree = tm.simulate("a", AcceptanceMode::FinalState);
        assert!(tree.accepted());
        assert_eq!(tree.size(), 3);
        let path = tree.witness();
        assert_eq!(path.len(), 2);
        assert_eq!(tree.node(path[1]).label(), "q2");
        let active: Vec<_> = tree
            .nodes()
            .filter(|(_, n)| n.is_active_in_simulation())
            .map(|(id, _)| id)
            .collect();
        assert_eq!(active, path);
        assert_eq!(tree.node(path[1]).parent(), Some(path[0]));
        assert!(tree.node(path[1]).is_accepted_by_final_state());
    }

    #[test]
    fn exhaustive_search_flags_every_accepted_node() {
        let tm = guessing(true);
        let witness = tm.simulate("a", AcceptanceMode::FinalState);
        assert_eq!(witness.size(), 2);

        let tree = tm.id_tree("a", AcceptanceMode::FinalState);
        assert_eq!(tree.size(), 3);
        assert_eq!(tree.nodes().filter(|(_, n)| n.is_accepted()).count(), 2);
        assert_eq!(tree.first_accepted(), witness.first_accepted());
        assert!(tree.nodes().all(|(_, n)| !n.is_active_in_simulation()));
        let root = tree.root().unwrap();
        assert_eq!(tree.node(root).children().len(), 2);
    }

    #[test]
    fn empty_operations_consume_nothing() {
        let tm = TM::builder()
            .with_edges([(0, TmOperation::new(EMPTY, '$', StackAction::Pop), 1)])
            .build(Some(0))
            .unwrap();
        assert!(tm.accepts("", AcceptanceMode::EmptyStack));
        let tree = tm.id_tree("b", AcceptanceMode::EmptyStack);
        assert_eq!(tree.size(), 2);
        let (child, node) = tree.nodes().last().unwrap();
        assert_eq!(node.consumed(), 0);
        assert_eq!(tree.remaining_input(child), "b");
        assert!(!tree.accepted());
    }

    #[test]
    fn empty_top_matches_only_empty_stack() {
        let tm = TM::builder()
            .with_accepting([2])
            .with_edges([
                (0, TmOperation::new(EMPTY, EMPTY, StackAction::Nothing), 2),
                (0, TmOperation::new(EMPTY, '$', StackAction::Pop), 1),
                (1, TmOperation::new(EMPTY, EMPTY, StackAction::Nothing), 2),
            ])
            .build(Some(0))
            .unwrap();
        let tree = tm.simulate("", AcceptanceMode::FinalState);
        assert!(tree.accepted());
        let labels: Vec<_> = tree
            .witness()
            .into_iter()
            .map(|id| tree.node(id).label().to_string())
            .collect();
        assert_eq!(labels, vec!["q0", "q1", "q2"]);
    }

    #[test_log::test]
    fn non_halting_machines_are_truncated() {
        let mut tm = TM::builder()
            .with_edges([(0, TmOperation::new(EMPTY, '$', StackAction::push("$")), 0)])
            .build(Some(0))
            .unwrap();
        tm.set_search_limits(SearchLimits::default().with_max_depth(50));
        let tree = tm.id_tree("", AcceptanceMode::EmptyStack);
        assert!(tree.truncated());
        assert!(!tree.accepted());
        assert_eq!(tree.size(), 51);

        tm.set_search_limits(SearchLimits::default().with_max_nodes(10));
        let tree = tm.id_tree("", AcceptanceMode::EmptyStack);
        assert!(tree.truncated());
        assert_eq!(tree.size(), 10);
    }

    #[test]
    fn dump_shows_every_node() {
        let tm = guessing(false);
        let tree = tm.id_tree("a", AcceptanceMode::FinalState);
        let dump = tree.show();
        assert_eq!(dump.lines().count(), 3);
        assert!(dump.starts_with("(q0, a, $)"));
        assert!(dump.contains("(q2, λ, $)"));
    }

    #[test]
    fn playback_activates_node_states() {
        let mut tm = guessing(false);
        let tree = tm.simulate("a", AcceptanceMode::FinalState);
        let last = tree.node(*tree.witness().last().unwrap()).clone();
        tm.activate_node(&last);
        let active: Vec<_> = tm
            .states()
            .filter(|(_, s)| s.is_active_in_simulation())
            .map(|(_, s)| s.label().to_string())
            .collect();
        assert_eq!(active, vec!["q2"]);
        tm.deactivate_all_states_in_simulation();
        assert!(tm.states().all(|(_, s)| !s.is_active_in_simulation()));
    }
}
