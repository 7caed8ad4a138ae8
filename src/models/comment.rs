// src/models/comment.rs

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'comments' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub blog_id: i64,
    pub user_id: i64,
    /// The comment being replied to, absent for top-level comments.
    pub parent_id: Option<i64>,
    pub content: String,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for creating a new comment.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCommentRequest {
    #[validate(length(
        min = 1,
        max = 1000,
        message = "Comment must be between 1 and 1000 characters"
    ))]
    pub content: String,

    /// Optional: the ID of the comment being replied to.
    pub parent_id: Option<i64>,
}

/// A comment row with its author's public profile inlined.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CommentWithAuthor {
    pub id: i64,
    pub blog_id: i64,
    pub user_id: i64,
    pub username: String,
    pub avatar_url: Option<String>,
    pub parent_id: Option<i64>,
    pub content: String,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// One node of the rendered reply tree.
#[derive(Debug, Serialize)]
pub struct CommentNode {
    #[serde(flatten)]
    pub comment: CommentWithAuthor,
    pub replies: Vec<CommentNode>,
}

/// Converts a flat, chronologically ordered comment list into a nested reply
/// tree.
///
/// Two passes over the input: the first indexes every comment by id, the
/// second attaches each comment to its parent's reply list, or to the root
/// list when it has no parent. A parent_id that does not resolve within this
/// batch also lands at the root rather than erroring. Input order is
/// preserved within every sibling group, so rebuilding from the same flat
/// list always yields the same tree. O(n) time and space; reply depth is
/// unbounded.
pub fn build_comment_tree(comments: Vec<CommentWithAuthor>) -> Vec<CommentNode> {
    let index: HashMap<i64, usize> = comments
        .iter()
        .enumerate()
        .map(|(pos, c)| (c.id, pos))
        .collect();

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); comments.len()];
    let mut roots: Vec<usize> = Vec::new();

    for (pos, comment) in comments.iter().enumerate() {
        match comment.parent_id.and_then(|pid| index.get(&pid).copied()) {
            Some(parent) if parent != pos => children[parent].push(pos),
            // No parent, or the parent is missing from this batch: render at
            // the root.
            _ => roots.push(pos),
        }
    }

    let mut slots: Vec<Option<CommentWithAuthor>> = comments.into_iter().map(Some).collect();

    roots
        .iter()
        .filter_map(|&root| assemble(root, &mut slots, &children))
        .collect()
}

fn assemble(
    pos: usize,
    slots: &mut [Option<CommentWithAuthor>],
    children: &[Vec<usize>],
) -> Option<CommentNode> {
    let comment = slots[pos].take()?;
    let replies = children[pos]
        .iter()
        .filter_map(|&child| assemble(child, slots, children))
        .collect();
    Some(CommentNode { comment, replies })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comment(id: i64, parent_id: Option<i64>) -> CommentWithAuthor {
        CommentWithAuthor {
            id,
            blog_id: 1,
            user_id: 7,
            username: format!("user{}", id),
            avatar_url: None,
            parent_id,
            content: format!("comment {}", id),
            created_at: None,
        }
    }

    fn flatten_preorder(nodes: &[CommentNode], out: &mut Vec<i64>) {
        for node in nodes {
            out.push(node.comment.id);
            flatten_preorder(&node.replies, out);
        }
    }

    #[test]
    fn empty_input_builds_empty_tree() {
        assert!(build_comment_tree(Vec::new()).is_empty());
    }

    #[test]
    fn replies_nest_under_their_parents() {
        // 1 ── 2 ── 4
        //  └── 3
        // 5
        let tree = build_comment_tree(vec![
            comment(1, None),
            comment(2, Some(1)),
            comment(3, Some(1)),
            comment(4, Some(2)),
            comment(5, None),
        ]);

        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].comment.id, 1);
        assert_eq!(tree[1].comment.id, 5);

        let roots_children: Vec<i64> = tree[0].replies.iter().map(|n| n.comment.id).collect();
        assert_eq!(roots_children, vec![2, 3]);
        assert_eq!(tree[0].replies[0].replies[0].comment.id, 4);
        assert!(tree[1].replies.is_empty());
    }

    #[test]
    fn preorder_flatten_reproduces_every_id_exactly_once() {
        let input = vec![
            comment(10, None),
            comment(11, Some(10)),
            comment(12, None),
            comment(13, Some(11)),
            comment(14, Some(12)),
            comment(15, Some(10)),
        ];
        let expected: Vec<i64> = input.iter().map(|c| c.id).collect();

        let tree = build_comment_tree(input);
        let mut flattened = Vec::new();
        flatten_preorder(&tree, &mut flattened);

        let mut sorted = flattened.clone();
        sorted.sort_unstable();
        let mut expected_sorted = expected;
        expected_sorted.sort_unstable();
        assert_eq!(sorted, expected_sorted);
    }

    #[test]
    fn orphaned_parent_reference_falls_back_to_root() {
        // Parent 99 is not part of the batch.
        let tree = build_comment_tree(vec![
            comment(1, None),
            comment(2, Some(99)),
            comment(3, Some(1)),
        ]);

        let root_ids: Vec<i64> = tree.iter().map(|n| n.comment.id).collect();
        assert_eq!(root_ids, vec![1, 2]);
        assert_eq!(tree[0].replies[0].comment.id, 3);
    }

    #[test]
    fn sibling_order_follows_input_order() {
        let tree = build_comment_tree(vec![
            comment(1, None),
            comment(4, Some(1)),
            comment(2, Some(1)),
            comment(9, Some(1)),
        ]);

        let sibling_ids: Vec<i64> = tree[0].replies.iter().map(|n| n.comment.id).collect();
        assert_eq!(sibling_ids, vec![4, 2, 9]);
    }

    #[test]
    fn rebuilding_from_the_same_input_is_idempotent() {
        let input = vec![
            comment(1, None),
            comment(2, Some(1)),
            comment(3, Some(2)),
            comment(4, None),
            comment(5, Some(4)),
        ];
        let clone = input.clone();

        let mut first = Vec::new();
        flatten_preorder(&build_comment_tree(input), &mut first);
        let mut second = Vec::new();
        flatten_preorder(&build_comment_tree(clone), &mut second);

        assert_eq!(first, second);
    }

    #[test]
    fn deep_reply_chains_are_supported() {
        let mut input = vec![comment(0, None)];
        for id in 1..200 {
            input.push(comment(id, Some(id - 1)));
        }

        let tree = build_comment_tree(input);
        assert_eq!(tree.len(), 1);

        let mut depth = 0;
        let mut node = &tree[0];
        while let Some(next) = node.replies.first() {
            node = next;
            depth += 1;
        }
        assert_eq!(depth, 199);
    }
}
