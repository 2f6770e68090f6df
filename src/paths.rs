//! Path enumeration.
//!
//! Depth-first extraction of every root-to-leaf traversal of the context
//! tree. Sibling contexts compose in sequence, conditionals fork, and the
//! true-polarity continuation is always emitted before the false one. An
//! `if` without `else` still yields the false path: it carries the negated
//! predicate and no body.

use crate::context::{AssignmentContext, ConditionalContext, Context, ContextTree};

/// One element of a path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step<'t> {
    Assign(&'t AssignmentContext),
    Branch {
        ctx: &'t ConditionalContext,
        polarity: bool,
    },
}

/// A root-to-leaf traversal, in tree order.
#[derive(Debug, Clone, PartialEq)]
pub struct Path<'t> {
    pub steps: Vec<Step<'t>>,
}

impl<'t> Path<'t> {
    /// The innermost conditional on the path, if any.
    #[must_use]
    pub fn innermost_branch(&self) -> Option<(&'t ConditionalContext, bool)> {
        self.steps.iter().rev().find_map(|step| match step {
            Step::Branch { ctx, polarity } => Some((*ctx, *polarity)),
            Step::Assign(_) => None,
        })
    }
}

/// Enumerate all paths in DFS pre-order.
#[must_use]
pub fn enumerate(tree: &ContextTree) -> Vec<Path<'_>> {
    let mut out = Vec::new();
    let mut prefix = Vec::new();
    walk(&[tree.root.children.as_slice()], &mut prefix, &mut out);
    out
}

/// `pending` is the stack of context slices still to traverse, innermost
/// first; it stands in for the parent back-links the tree does not keep.
fn walk<'t>(pending: &[&'t [Context]], prefix: &mut Vec<Step<'t>>, out: &mut Vec<Path<'t>>) {
    let mut segments = pending;
    while let Some((first, rest)) = segments.split_first() {
        if first.is_empty() {
            segments = rest;
        } else {
            break;
        }
    }

    let Some((segment, rest)) = segments.split_first() else {
        out.push(Path {
            steps: prefix.clone(),
        });
        return;
    };
    let (head, tail) = segment
        .split_first()
        .expect("leading empty segments were skipped");

    match head {
        Context::Assignment(assign) => {
            prefix.push(Step::Assign(assign));
            // Assignment nodes are leaves of the tree; when more contexts
            // follow, the traversal both terminates here and continues
            // through the remaining siblings.
            let more_follows = !tail.is_empty() || rest.iter().any(|seg| !seg.is_empty());
            if more_follows {
                out.push(Path {
                    steps: prefix.clone(),
                });
            }
            let mut next = vec![tail];
            next.extend_from_slice(rest);
            walk(&next, prefix, out);
            prefix.pop();
        }
        Context::Conditional(cond) => {
            let mut next = vec![cond.then_children.as_slice(), tail];
            next.extend_from_slice(rest);
            prefix.push(Step::Branch {
                ctx: cond,
                polarity: true,
            });
            walk(&next, prefix, out);
            prefix.pop();

            let mut next = vec![cond.else_children.as_slice(), tail];
            next.extend_from_slice(rest);
            prefix.push(Step::Branch {
                ctx: cond,
                polarity: false,
            });
            walk(&next, prefix, out);
            prefix.pop();
        }
    }
}
