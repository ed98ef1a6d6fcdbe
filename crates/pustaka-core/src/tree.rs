//! Recursive block tree assembly.
//!
//! [`fetch_block_tree`] produces the direct children of a block or page id
//! with every nested subtree fully populated. Pagination within one children
//! listing is strictly sequential (each cursor depends on the prior
//! response); sibling subtrees are fetched concurrently up to a cap, with
//! results attached by position so the store's document order is preserved
//! exactly.
//!
//! Nesting is walked with an explicit frontier worklist instead of call-stack
//! recursion, so a pathologically deep document cannot overflow the stack.

use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::debug;

use crate::source::{RemoteStore, drain_pages};
use crate::types::Block;
use crate::Result;

/// Fetches the direct children of `id`, each with its own subtree fully
/// populated, in the remote store's document order.
///
/// Any failed remote call aborts the whole assembly; no partial tree is
/// returned.
pub async fn fetch_block_tree(
    store: &dyn RemoteStore,
    id: &str,
    max_in_flight: usize,
) -> Result<Vec<Block>> {
    let mut roots = fetch_children(store, id).await?;

    // Paths into `roots` of nodes whose subtrees are still unfetched.
    let mut frontier = pending_paths(&roots, &[]);
    let mut depth = 0usize;
    while !frontier.is_empty() {
        depth += 1;
        debug!(root_id = id, depth, pending = frontier.len(), "fetching subtree level");

        let ids: Vec<String> = frontier
            .iter()
            .map(|path| node(&roots, path).id.clone())
            .collect();
        let subtrees: Vec<Vec<Block>> = stream::iter(
            ids.iter()
                .map(|block_id| fetch_children(store, block_id)),
        )
        .buffered(max_in_flight.max(1))
        .try_collect()
        .await?;

        let mut next = Vec::new();
        for (path, children) in frontier.iter().zip(subtrees) {
            next.extend(pending_paths(&children, path));
            node_mut(&mut roots, path).children = Some(children);
        }
        frontier = next;
    }
    Ok(roots)
}

async fn fetch_children(store: &dyn RemoteStore, id: &str) -> Result<Vec<Block>> {
    drain_pages(|cursor| async move { store.list_children(id, cursor.as_deref()).await }).await
}

fn pending_paths(blocks: &[Block], prefix: &[usize]) -> Vec<Vec<usize>> {
    blocks
        .iter()
        .enumerate()
        .filter(|(_, block)| block.has_children && block.children.is_none())
        .map(|(idx, _)| {
            let mut path = prefix.to_vec();
            path.push(idx);
            path
        })
        .collect()
}

fn node<'a>(roots: &'a [Block], path: &[usize]) -> &'a Block {
    let mut block = &roots[path[0]];
    for &idx in &path[1..] {
        match &block.children {
            Some(children) => block = &children[idx],
            None => unreachable!("frontier paths only traverse attached subtrees"),
        }
    }
    block
}

fn node_mut<'a>(roots: &'a mut [Block], path: &[usize]) -> &'a mut Block {
    let mut block = &mut roots[path[0]];
    for &idx in &path[1..] {
        match &mut block.children {
            Some(children) => block = &mut children[idx],
            None => unreachable!("frontier paths only traverse attached subtrees"),
        }
    }
    block
}
