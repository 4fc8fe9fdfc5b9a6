use std::collections::{BTreeMap, HashSet};

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::widgets::ScrollbarOrientation;
use repolens_core::model::AnalysisResult;
use tui_tree_widget::{Scrollbar as TreeScrollbar, Tree, TreeItem, TreeState};

use crate::keymap;
use crate::theme::Theme;
use crate::ui::text::{compact_hint, key_hint_height, key_hint_paragraph, wrapped_paragraph};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TreeAction {
    None,
    Back,
}

#[derive(Debug, Clone)]
struct TreeNode {
    label: String,
    is_dir: bool,
    size: Option<u64>,
    children: Vec<String>,
}

/// File-tree browser built from the flat tree-entry list of an analysis.
/// Keys are full slash-separated paths; directories start collapsed.
#[derive(Debug)]
pub(crate) struct TreeViewState {
    repo_name: String,
    nodes: BTreeMap<String, TreeNode>,
    roots: Vec<String>,
    collapsed: HashSet<String>,
    visible: Vec<String>,
    cursor: usize,
}

impl TreeViewState {
    pub(crate) fn from_result(result: &AnalysisResult) -> Self {
        let mut nodes = BTreeMap::<String, TreeNode>::new();
        let mut roots = Vec::<String>::new();

        for entry in &result.file_tree {
            insert_path(&mut nodes, &mut roots, &entry.path, entry.is_dir(), entry.size);
        }

        let collapsed: HashSet<String> = nodes
            .iter()
            .filter(|(_, node)| node.is_dir)
            .map(|(key, _)| key.clone())
            .collect();

        let mut state = Self {
            repo_name: result.repo.full_name.clone(),
            nodes,
            roots,
            collapsed,
            visible: Vec::new(),
            cursor: 0,
        };
        state.refresh_visible();
        state
    }

    fn refresh_visible(&mut self) {
        self.visible.clear();
        let roots = self.roots.clone();
        for root in &roots {
            self.push_visible(root);
        }

        if self.visible.is_empty() {
            self.cursor = 0;
        } else if self.cursor >= self.visible.len() {
            self.cursor = self.visible.len() - 1;
        }
    }

    fn push_visible(&mut self, key: &str) {
        self.visible.push(key.to_string());

        let Some(node) = self.nodes.get(key) else {
            return;
        };
        if !node.is_dir || self.collapsed.contains(key) {
            return;
        }

        let children = node.children.clone();
        for child in &children {
            self.push_visible(child);
        }
    }

    fn current_key(&self) -> Option<&str> {
        self.visible.get(self.cursor).map(String::as_str)
    }

    pub(crate) fn selected_detail(&self) -> Option<String> {
        let key = self.current_key()?;
        let node = self.nodes.get(key)?;
        if node.is_dir {
            Some(format!("{key}/ (directory)"))
        } else {
            match node.size {
                Some(size) => Some(format!("{key} ({})", format_size(size))),
                None => Some(key.to_string()),
            }
        }
    }

    pub(crate) fn on_key(&mut self, key: KeyEvent) -> TreeAction {
        if keymap::is_back(key) || matches!(key.code, KeyCode::Char('q')) {
            return TreeAction::Back;
        }

        if keymap::is_up(key) {
            self.cursor = self.cursor.saturating_sub(1);
            return TreeAction::None;
        }

        if keymap::is_down(key) {
            if self.cursor + 1 < self.visible.len() {
                self.cursor += 1;
            }
            return TreeAction::None;
        }

        if keymap::is_confirm(key) || keymap::is_toggle(key) {
            self.toggle_current();
            return TreeAction::None;
        }

        if keymap::is_right(key) {
            self.expand_current();
            return TreeAction::None;
        }

        if keymap::is_left(key) {
            self.collapse_or_ascend();
            return TreeAction::None;
        }

        TreeAction::None
    }

    fn toggle_current(&mut self) {
        let Some(key) = self.current_key().map(str::to_string) else {
            return;
        };
        if !self.nodes.get(&key).is_some_and(|node| node.is_dir) {
            return;
        }

        if !self.collapsed.remove(&key) {
            self.collapsed.insert(key);
        }
        self.refresh_visible();
    }

    fn expand_current(&mut self) {
        let Some(key) = self.current_key().map(str::to_string) else {
            return;
        };
        if self.nodes.get(&key).is_some_and(|node| node.is_dir) {
            self.collapsed.remove(&key);
            self.refresh_visible();
        }
    }

    fn collapse_or_ascend(&mut self) {
        let Some(key) = self.current_key().map(str::to_string) else {
            return;
        };

        let is_open_dir = self.nodes.get(&key).is_some_and(|node| node.is_dir)
            && !self.collapsed.contains(&key);
        if is_open_dir {
            self.collapsed.insert(key);
            self.refresh_visible();
            return;
        }

        if let Some(parent) = parent_key(&key)
            && let Some(position) = self.visible.iter().position(|row| *row == parent)
        {
            self.cursor = position;
        }
    }

    fn tree_items(&self) -> Vec<TreeItem<'static, String>> {
        self.roots
            .iter()
            .filter_map(|root| self.tree_item_for(root))
            .collect()
    }

    fn tree_item_for(&self, key: &str) -> Option<TreeItem<'static, String>> {
        let node = self.nodes.get(key)?;
        let label = if node.is_dir {
            format!("{}/", node.label)
        } else {
            node.label.clone()
        };

        if node.children.is_empty() {
            return Some(TreeItem::new_leaf(key.to_string(), label));
        }

        let children: Vec<TreeItem<'static, String>> = node
            .children
            .iter()
            .filter_map(|child| self.tree_item_for(child))
            .collect();
        Some(
            TreeItem::new(key.to_string(), label, children)
                .expect("file tree identifiers are unique"),
        )
    }

    fn tree_state(&self) -> TreeState<String> {
        let mut state = TreeState::default();
        for key in &self.visible {
            let is_open_dir = self.nodes.get(key).is_some_and(|node| node.is_dir)
                && !self.collapsed.contains(key);
            if is_open_dir {
                state.open(identifier_path(key));
            }
        }

        if let Some(key) = self.current_key() {
            state.select(identifier_path(key));
        }
        state
    }

    pub(crate) fn render(&self, frame: &mut Frame<'_>, theme: &Theme) {
        let area = frame.area();
        let key_text = compact_hint(
            area.width,
            "Up/Down or j/k: move    Enter/Space: toggle folder    ←→: collapse/expand    Esc/q: back",
            "j/k: move    Enter: toggle    ←→: fold    Esc: back",
            "jk move | Enter toggle | Esc back",
        );
        let footer_height = key_hint_height(area.width, key_text);

        let [body_area, detail_area, footer_area] = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(6),
                Constraint::Length(1),
                Constraint::Length(footer_height),
            ])
            .areas(area);

        let title = format!("File Tree — {}", self.repo_name);
        let items = self.tree_items();
        if items.is_empty() {
            frame.render_widget(
                wrapped_paragraph("No file tree data available.")
                    .block(theme.chrome(title)),
                body_area,
            );
        } else {
            let mut state = self.tree_state();
            let tree = Tree::new(&items)
                .expect("file tree identifiers are unique")
                .block(theme.chrome(title))
                .experimental_scrollbar(Some(
                    TreeScrollbar::new(ScrollbarOrientation::VerticalRight)
                        .begin_symbol(None)
                        .end_symbol(None),
                ))
                .highlight_style(theme.list_highlight())
                .highlight_symbol(">> ");
            frame.render_stateful_widget(tree, body_area, &mut state);
        }

        if let Some(detail) = self.selected_detail() {
            frame.render_widget(wrapped_paragraph(detail), detail_area);
        }

        frame.render_widget(
            key_hint_paragraph(key_text).block(theme.key_block()),
            footer_area,
        );
    }
}

fn insert_path(
    nodes: &mut BTreeMap<String, TreeNode>,
    roots: &mut Vec<String>,
    path: &str,
    is_dir: bool,
    size: Option<u64>,
) {
    let segments: Vec<&str> = path.split('/').filter(|part| !part.is_empty()).collect();
    if segments.is_empty() {
        return;
    }

    let mut prefix = String::new();
    for (index, segment) in segments.iter().enumerate() {
        let parent = (!prefix.is_empty()).then(|| prefix.clone());
        if !prefix.is_empty() {
            prefix.push('/');
        }
        prefix.push_str(segment);
        let is_last = index + 1 == segments.len();

        let node = nodes.entry(prefix.clone()).or_insert_with(|| TreeNode {
            label: (*segment).to_string(),
            is_dir: !is_last || is_dir,
            size: None,
            children: Vec::new(),
        });
        if is_last {
            node.is_dir = is_dir;
            node.size = size;
        }

        match parent {
            Some(parent_prefix) => {
                if let Some(parent_node) = nodes.get_mut(&parent_prefix)
                    && !parent_node.children.contains(&prefix)
                {
                    parent_node.children.push(prefix.clone());
                    parent_node.children.sort();
                }
            }
            None => {
                if !roots.contains(&prefix) {
                    roots.push(prefix.clone());
                    roots.sort();
                }
            }
        }
    }
}

fn parent_key(key: &str) -> Option<String> {
    key.rsplit_once('/').map(|(parent, _)| parent.to_string())
}

fn identifier_path(key: &str) -> Vec<String> {
    let mut identifiers = Vec::new();
    let mut prefix = String::new();
    for segment in key.split('/').filter(|part| !part.is_empty()) {
        if !prefix.is_empty() {
            prefix.push('/');
        }
        prefix.push_str(segment);
        identifiers.push(prefix.clone());
    }
    identifiers
}

fn format_size(bytes: u64) -> String {
    if bytes >= 1_048_576 {
        format!("{:.1} MB", bytes as f64 / 1_048_576.0)
    } else if bytes >= 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{bytes} B")
    }
}
