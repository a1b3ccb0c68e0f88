use comrak::nodes::{AstNode, NodeHtmlBlock, NodeValue};
use katex::{OptsBuilder, OutputType};
use tracing::warn;

use crate::application::render::types::RenderError;

const MATH_LANGUAGE: &str = "math";

#[derive(Default)]
pub(crate) struct RewriteOutcome {
    pub(crate) contains_code: bool,
    pub(crate) contains_math: bool,
    pub(crate) contains_footnotes: bool,
    pub(crate) math_fragments: Vec<MathFragment>,
}

/// KaTeX output parked behind a placeholder while the sanitiser runs.
#[derive(Clone)]
pub(crate) struct MathFragment {
    pub(crate) placeholder: String,
    pub(crate) html: String,
    pub(crate) is_block: bool,
}

pub(crate) fn rewrite_ast<'a>(
    root: &'a AstNode<'a>,
    slug: &str,
) -> Result<RewriteOutcome, RenderError> {
    let mut walker = RewriteWalker {
        outcome: RewriteOutcome::default(),
        slug,
    };
    walker.visit_nodes(root)?;
    Ok(walker.outcome)
}

struct RewriteWalker<'s> {
    outcome: RewriteOutcome,
    slug: &'s str,
}

impl RewriteWalker<'_> {
    fn visit_nodes(&mut self, node: &AstNode<'_>) -> Result<(), RenderError> {
        if matches!(node.data.borrow().value, NodeValue::FootnoteDefinition(_)) {
            self.outcome.contains_footnotes = true;
        }

        if let Some((literal, display_mode)) = extract_math(node) {
            self.replace_math(node, &literal, display_mode)?;
        } else if let Some((info, literal)) = extract_code_block(node) {
            let language = info.split_whitespace().next().unwrap_or_default();
            if language.eq_ignore_ascii_case(MATH_LANGUAGE) {
                self.replace_math(node, &literal, true)?;
            } else {
                self.outcome.contains_code = true;
            }
        }

        let mut child = node.first_child();
        while let Some(next) = child {
            self.visit_nodes(next)?;
            child = next.next_sibling();
        }

        Ok(())
    }

    fn replace_math(
        &mut self,
        node: &AstNode<'_>,
        literal: &str,
        display_mode: bool,
    ) -> Result<(), RenderError> {
        let html = match render_math_html(literal, display_mode) {
            Ok(html) => html,
            Err(err) => {
                warn!(
                    target = "application::render::math",
                    slug = self.slug,
                    "KaTeX rendering failed: {err}"
                );
                apply_math_fallback(node, literal, display_mode);
                self.outcome.contains_code = true;
                return Ok(());
            }
        };

        let container = if display_mode {
            format!("<div data-role=\"math-block\" data-math-style=\"display\">{html}</div>")
        } else {
            format!("<span data-role=\"math-inline\" data-math-style=\"inline\">{html}</span>")
        };
        let placeholder = format!(
            "__KATEX_PLACEHOLDER_{}__",
            self.outcome.math_fragments.len()
        );

        let mut data = node.data.borrow_mut();
        data.value = if display_mode {
            NodeValue::HtmlBlock(NodeHtmlBlock {
                block_type: 0,
                literal: format!("<div>{placeholder}</div>"),
            })
        } else {
            NodeValue::HtmlInline(placeholder.clone())
        };

        self.outcome.math_fragments.push(MathFragment {
            placeholder,
            html: container,
            is_block: display_mode,
        });
        self.outcome.contains_math = true;
        Ok(())
    }
}

/// Render a KaTeX expression to HTML.
fn render_math_html(literal: &str, display_mode: bool) -> Result<String, RenderError> {
    let mut builder = OptsBuilder::default();
    builder.display_mode(display_mode);
    builder.output_type(OutputType::Html);

    let opts = builder.build().map_err(|err| RenderError::Document {
        message: format!("failed to build KaTeX options: {err}"),
    })?;

    katex::render_with_opts(literal, opts).map_err(|err| RenderError::Document {
        message: format!("KaTeX rendering failed: {err}"),
    })
}

fn apply_math_fallback(node: &AstNode<'_>, literal: &str, display_mode: bool) {
    let escaped = ammonia::clean_text(literal);
    let mut data = node.data.borrow_mut();
    data.value = if display_mode {
        NodeValue::HtmlBlock(NodeHtmlBlock {
            block_type: 0,
            literal: format!(
                "<pre><code data-math-style=\"display\" data-language=\"math\">{escaped}</code></pre>"
            ),
        })
    } else {
        NodeValue::HtmlInline(format!("<code data-math-style=\"inline\">{escaped}</code>"))
    };
}

fn extract_math(node: &AstNode<'_>) -> Option<(String, bool)> {
    let data = node.data.borrow();
    match &data.value {
        NodeValue::Math(math) => Some((math.literal.clone(), math.display_math)),
        _ => None,
    }
}

fn extract_code_block(node: &AstNode<'_>) -> Option<(String, String)> {
    let data = node.data.borrow();
    match &data.value {
        NodeValue::CodeBlock(block) => Some((block.info.clone(), block.literal.clone())),
        _ => None,
    }
}
