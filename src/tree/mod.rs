//! Phylogenetic tree input.
//!
//! Trees come from an external builder as Newick files; only the postorder
//! order of their leaves is used, to decide which strains "discover" SNP
//! columns first.

mod newick;
mod node;
mod traversal;

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub use newick::{parse_newick, NewickError};
pub use node::{NodeId, PhyloTree, TreeNode};
pub use traversal::{leaf_order, Postorder};

/// Errors raised while reading a tree file.
#[derive(Debug, Error)]
pub enum TreeError {
    /// The file could not be read.
    #[error("failed to read tree {path}: {source}")]
    Io {
        /// Tree file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid Newick.
    #[error("failed to parse tree {path}: {source}")]
    Parse {
        /// Tree file.
        path: PathBuf,
        /// Parse error.
        #[source]
        source: NewickError,
    },
}

/// Location of the best tree for a species/group:
/// `<tree_dir>/<species>/<group>/RAxML_bestTree.<species>_<group>`.
pub fn best_tree_path(tree_dir: &Path, species: &str, group: &str) -> PathBuf {
    tree_dir
        .join(species)
        .join(group)
        .join(format!("RAxML_bestTree.{species}_{group}"))
}

/// Read a Newick file and return its leaf names in postorder.
pub fn read_tree_order(path: impl AsRef<Path>) -> Result<Vec<String>, TreeError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| TreeError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let tree = parse_newick(&text).map_err(|source| TreeError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(leaf_order(&tree))
}
