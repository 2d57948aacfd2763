use std::collections::BTreeMap;

/// Prefix tree over command names.
///
/// Children are kept in a `BTreeMap`, so a depth-first walk yields words in
/// sorted order without a separate sort.
#[derive(Debug, Default)]
pub struct Trie {
    root: Node,
    len: usize,
}

#[derive(Debug, Default)]
struct Node {
    children: BTreeMap<char, Node>,
    terminal: bool,
}

impl Trie {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `word`. Inserting a word twice is a no-op.
    pub fn insert(&mut self, word: &str) {
        let mut node = &mut self.root;
        for ch in word.chars() {
            node = node.children.entry(ch).or_default();
        }
        if !node.terminal {
            node.terminal = true;
            self.len += 1;
        }
    }

    /// Number of distinct words.
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Every word starting with `prefix`, sorted.
    pub fn with_prefix(&self, prefix: &str) -> Vec<String> {
        let mut words = Vec::new();
        if let Some(node) = self.find(prefix) {
            let mut buf = prefix.to_string();
            collect(node, &mut buf, &mut words);
        }
        words
    }

    fn find(&self, prefix: &str) -> Option<&Node> {
        prefix
            .chars()
            .try_fold(&self.root, |node, ch| node.children.get(&ch))
    }
}

fn collect(node: &Node, buf: &mut String, out: &mut Vec<String>) {
    if node.terminal {
        out.push(buf.clone());
    }
    for (ch, child) in &node.children {
        buf.push(*ch);
        collect(child, buf, out);
        buf.pop();
    }
}

impl<S: AsRef<str>> FromIterator<S> for Trie {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut trie = Trie::new();
        for word in iter {
            trie.insert(word.as_ref());
        }
        trie
    }
}
