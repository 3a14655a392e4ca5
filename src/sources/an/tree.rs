//! Dossier → reading stage → procedural act tree built from a flat block
//! stream, stored in an `ego_tree` arena.

use crate::sources::an::acts::extract_acts;
use crate::sources::an::classifier::{classify_block, ActRole, BlockRole};
use crate::sources::common::{extract_blocks, TextBlock};
use crate::types::{ReadingStage, ReadingStageKind, StepStatus};
use ego_tree::{NodeId, NodeRef, Tree};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Root,
    Stage(ReadingStageKind),
    Act(ActRole),
}

impl NodeKind {
    /// Which node kinds may directly hold a child of kind `child`.
    fn can_contain(self, child: NodeKind) -> bool {
        matches!(
            (self, child),
            (NodeKind::Root, NodeKind::Stage(_))
                | (NodeKind::Root, NodeKind::Act(_))
                | (NodeKind::Stage(_), NodeKind::Act(_))
        )
    }
}

#[derive(Debug, Clone)]
pub struct ProcedureNode {
    pub kind: NodeKind,
    /// Every block seen while this node was the cursor, header included.
    pub blocks: Vec<TextBlock>,
}

impl ProcedureNode {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            blocks: Vec::new(),
        }
    }
}

pub struct ProcedureTree {
    tree: Tree<ProcedureNode>,
    base_url: String,
}

/// Blocks worth classifying: not empty, not a `_` rule line, not the
/// breadcrumb.
pub fn is_dossier_block(block: &TextBlock) -> bool {
    !block.text.is_empty() && !block.text.starts_with('_') && !block.text.starts_with("Accueil")
}

pub fn dossier_blocks(html: &str) -> Result<Vec<TextBlock>, String> {
    Ok(extract_blocks(html)?
        .into_iter()
        .filter(is_dossier_block)
        .collect())
}

impl ProcedureTree {
    pub fn build(blocks: impl IntoIterator<Item = TextBlock>, base_url: &str) -> Self {
        let mut tree = Tree::new(ProcedureNode::new(NodeKind::Root));
        let mut cursor = tree.root().id();

        for block in blocks {
            let kind = match classify_block(&block) {
                BlockRole::ReadingStageHeader(kind) => Some(NodeKind::Stage(kind)),
                BlockRole::Act(role) => Some(NodeKind::Act(role)),
                BlockRole::None => None,
            };

            if let Some(kind) = kind {
                let parent = relevant_parent(&tree, cursor, kind);
                if let Some(mut parent) = tree.get_mut(parent) {
                    cursor = parent.append(ProcedureNode::new(kind)).id();
                }
            }

            if let Some(mut node) = tree.get_mut(cursor) {
                node.value().blocks.push(block);
            }
        }

        Self {
            tree,
            base_url: base_url.to_string(),
        }
    }

    pub fn from_html(html: &str, base_url: &str) -> Result<Self, String> {
        Ok(Self::build(dossier_blocks(html)?, base_url))
    }

    pub fn root(&self) -> NodeRef<'_, ProcedureNode> {
        self.tree.root()
    }

    /// Reading stages in document order. Acts met before any stage header are
    /// grouped into stages without a kind.
    pub fn extract_data(&self) -> Vec<ReadingStage> {
        let mut stages = Vec::new();
        let mut orphans: Vec<_> = Vec::new();

        for child in self.tree.root().children() {
            match child.value().kind {
                NodeKind::Stage(kind) => {
                    if !orphans.is_empty() {
                        stages.push(ReadingStage {
                            kind: None,
                            status: None,
                            acts: std::mem::take(&mut orphans),
                        });
                    }
                    if let Some(stage) = self.extract_stage(child, kind) {
                        stages.push(stage);
                    }
                }
                NodeKind::Act(role) => {
                    orphans.extend(extract_acts(role, &child.value().blocks, &self.base_url));
                }
                NodeKind::Root => {}
            }
        }

        if !orphans.is_empty() {
            stages.push(ReadingStage {
                kind: None,
                status: None,
                acts: orphans,
            });
        }
        stages
    }

    fn extract_stage(
        &self,
        node: NodeRef<'_, ProcedureNode>,
        kind: ReadingStageKind,
    ) -> Option<ReadingStage> {
        let header = node.value().blocks.first()?;
        let status = if kind == ReadingStageKind::Cmp {
            joint_committee_status(&header.folded)
        } else {
            None
        };

        let acts = node
            .children()
            .filter_map(|child| match child.value().kind {
                NodeKind::Act(role) => Some(extract_acts(role, &child.value().blocks, &self.base_url)),
                _ => None,
            })
            .flatten()
            .collect();

        Some(ReadingStage {
            kind: Some(kind),
            status,
            acts,
        })
    }
}

fn joint_committee_status(folded_header: &str) -> Option<StepStatus> {
    if folded_header.contains("(desaccord)") {
        Some(StepStatus::Desaccord)
    } else if folded_header.contains("(accord)") {
        Some(StepStatus::Accord)
    } else {
        None
    }
}

/// Nearest node, starting at the cursor and walking up, allowed to contain
/// a node of `kind`.
fn relevant_parent(tree: &Tree<ProcedureNode>, cursor: NodeId, kind: NodeKind) -> NodeId {
    let root = tree.root().id();
    let Some(cursor) = tree.get(cursor) else {
        return root;
    };
    std::iter::once(cursor)
        .chain(cursor.ancestors())
        .find(|node| node.value().kind.can_contain(kind))
        .map_or(root, |node| node.id())
}
