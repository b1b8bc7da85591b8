use std::collections::BTreeMap;
use std::str::Chars;

/// Character trie answering "which registered spelling starts here?".
///
/// Lookups return the *longest* registered spelling that is a prefix of the
/// text at a given offset, so `<=` wins over `<` and `asin` over `a`.
#[derive(Clone, Debug)]
pub struct SymbolTrie<T> {
    root: Node<T>,
    len: usize,
}

#[derive(Clone, Debug)]
struct Node<T> {
    value: Option<T>,
    children: BTreeMap<char, Node<T>>,
}

impl<T> Default for Node<T> {
    fn default() -> Self {
        Self {
            value: None,
            children: BTreeMap::new(),
        }
    }
}

impl<T> Default for SymbolTrie<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SymbolTrie<T> {
    pub fn new() -> Self {
        Self {
            root: Node::default(),
            len: 0,
        }
    }

    /// Number of registered spellings.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Registers `value` under `key`, returning whatever was registered
    /// under that exact spelling before.
    pub fn insert(&mut self, key: &str, value: T) -> Option<T> {
        let mut node = &mut self.root;
        for c in key.chars() {
            node = node.children.entry(c).or_default();
        }
        let previous = node.value.replace(value);
        if previous.is_none() {
            self.len += 1;
        }
        previous
    }

    /// Exact-spelling lookup.
    pub fn get(&self, key: &str) -> Option<&T> {
        let mut node = &self.root;
        for c in key.chars() {
            node = node.children.get(&c)?;
        }
        node.value.as_ref()
    }

    pub fn remove(&mut self, key: &str) -> Option<T> {
        let removed = Self::remove_from(&mut self.root, &mut key.chars());
        if removed.is_some() {
            self.len -= 1;
        }
        removed
    }

    fn remove_from(node: &mut Node<T>, chars: &mut Chars) -> Option<T> {
        match chars.next() {
            None => node.value.take(),
            Some(c) => {
                let child = node.children.get_mut(&c)?;
                let removed = Self::remove_from(child, chars);
                // Prune branches that no longer lead to any spelling.
                if child.value.is_none() && child.children.is_empty() {
                    node.children.remove(&c);
                }
                removed
            }
        }
    }

    /// Finds the longest registered spelling starting at byte `offset` of
    /// `text`. Returns the value and the number of bytes it spans.
    ///
    /// `offset` must lie on a char boundary.
    pub fn longest_match(&self, text: &str, offset: usize) -> Option<(&T, usize)> {
        let mut node = &self.root;
        let mut best = None;
        for (index, c) in text[offset..].char_indices() {
            match node.children.get(&c) {
                Some(child) => node = child,
                None => break,
            }
            if let Some(value) = &node.value {
                best = Some((value, index + c.len_utf8()));
            }
        }
        best
    }
}
