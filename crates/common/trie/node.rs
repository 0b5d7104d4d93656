use seqrex_crypto::keccak_hash;
use seqrex_rlp::structs::Encoder;

use crate::nibbles::Nibbles;

/// A node in an Ethereum compatible Merkle Patricia Trie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Branch(Box<BranchNode>),
    Extension(ExtensionNode),
    Leaf(LeafNode),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BranchNode {
    pub choices: [Option<Box<Node>>; 16],
    pub value: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionNode {
    pub prefix: Nibbles,
    pub child: Box<Node>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafNode {
    pub partial: Nibbles,
    pub value: Vec<u8>,
}

impl From<BranchNode> for Node {
    fn from(node: BranchNode) -> Self {
        Node::Branch(Box::new(node))
    }
}

impl From<ExtensionNode> for Node {
    fn from(node: ExtensionNode) -> Self {
        Node::Extension(node)
    }
}

impl From<LeafNode> for Node {
    fn from(node: LeafNode) -> Self {
        Node::Leaf(node)
    }
}

impl Node {
    /// Retrieves the value stored under `path` in the subtrie rooted here.
    pub fn get(&self, path: Nibbles) -> Option<&Vec<u8>> {
        match self {
            Node::Branch(node) => {
                if path.is_empty() {
                    (!node.value.is_empty()).then_some(&node.value)
                } else {
                    node.choices[path.at(0) as usize]
                        .as_ref()
                        .and_then(|child| child.get(path.offset(1)))
                }
            }
            Node::Extension(node) => {
                let common = node.prefix.common_prefix_len(&path);
                if common == node.prefix.len() {
                    node.child.get(path.offset(common))
                } else {
                    None
                }
            }
            Node::Leaf(node) => (node.partial == path).then_some(&node.value),
        }
    }

    /// Inserts `value` under `path`, returning the new subtrie root.
    pub fn insert(self, path: Nibbles, value: Vec<u8>) -> Node {
        match self {
            Node::Branch(mut node) => {
                if path.is_empty() {
                    node.value = value;
                } else {
                    let index = path.at(0) as usize;
                    let rest = path.offset(1);
                    node.choices[index] = Some(Box::new(match node.choices[index].take() {
                        Some(child) => child.insert(rest, value),
                        None => LeafNode {
                            partial: rest,
                            value,
                        }
                        .into(),
                    }));
                }
                Node::Branch(node)
            }
            Node::Extension(node) => node.insert(path, value),
            Node::Leaf(node) => node.insert(path, value),
        }
    }

    /// RLP encoding of the node.
    pub fn encode_raw(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        match self {
            Node::Branch(node) => {
                let mut encoder = Encoder::new(&mut buf);
                for choice in &node.choices {
                    encoder = match choice {
                        Some(child) => encode_child(encoder, child),
                        None => encoder.encode_bytes(&[]),
                    };
                }
                encoder.encode_bytes(&node.value).finish();
            }
            Node::Extension(node) => {
                let encoder = Encoder::new(&mut buf)
                    .encode_bytes(&node.prefix.encode_compact(false));
                encode_child(encoder, &node.child).finish();
            }
            Node::Leaf(node) => {
                Encoder::new(&mut buf)
                    .encode_bytes(&node.partial.encode_compact(true))
                    .encode_bytes(&node.value)
                    .finish();
            }
        }
        buf
    }
}

/// Child references embed nodes shorter than 32 bytes and hash the rest.
fn encode_child<'a>(encoder: Encoder<'a>, child: &Node) -> Encoder<'a> {
    let encoded = child.encode_raw();
    if encoded.len() < 32 {
        encoder.encode_raw(&encoded)
    } else {
        encoder.encode_bytes(&keccak_hash(&encoded))
    }
}

impl LeafNode {
    fn insert(self, path: Nibbles, value: Vec<u8>) -> Node {
        let common = self.partial.common_prefix_len(&path);
        if common == self.partial.len() && common == path.len() {
            return LeafNode {
                partial: self.partial,
                value,
            }
            .into();
        }

        let mut branch = BranchNode::default();
        let self_rest = self.partial.offset(common);
        if self_rest.is_empty() {
            branch.value = self.value;
        } else {
            branch.choices[self_rest.at(0) as usize] = Some(Box::new(
                LeafNode {
                    partial: self_rest.offset(1),
                    value: self.value,
                }
                .into(),
            ));
        }
        let path_rest = path.offset(common);
        if path_rest.is_empty() {
            branch.value = value;
        } else {
            branch.choices[path_rest.at(0) as usize] = Some(Box::new(
                LeafNode {
                    partial: path_rest.offset(1),
                    value,
                }
                .into(),
            ));
        }

        wrap_with_prefix(path.prefix(common), branch.into())
    }
}

impl ExtensionNode {
    fn insert(self, path: Nibbles, value: Vec<u8>) -> Node {
        let common = self.prefix.common_prefix_len(&path);
        if common == self.prefix.len() {
            return ExtensionNode {
                prefix: self.prefix,
                child: Box::new(self.child.insert(path.offset(common), value)),
            }
            .into();
        }

        let mut branch = BranchNode::default();
        let self_rest = self.prefix.offset(common);
        let subtree = if self_rest.len() == 1 {
            *self.child
        } else {
            ExtensionNode {
                prefix: self_rest.offset(1),
                child: self.child,
            }
            .into()
        };
        branch.choices[self_rest.at(0) as usize] = Some(Box::new(subtree));

        let path_rest = path.offset(common);
        if path_rest.is_empty() {
            branch.value = value;
        } else {
            branch.choices[path_rest.at(0) as usize] = Some(Box::new(
                LeafNode {
                    partial: path_rest.offset(1),
                    value,
                }
                .into(),
            ));
        }

        wrap_with_prefix(path.prefix(common), branch.into())
    }
}

/// Reintroduces the shared prefix above a freshly split branch.
fn wrap_with_prefix(prefix: Nibbles, node: Node) -> Node {
    if prefix.is_empty() {
        node
    } else {
        ExtensionNode {
            prefix,
            child: Box::new(node),
        }
        .into()
    }
}
