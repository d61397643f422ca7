use super::{Builder, Cursor, ShapeResult, actions::wedge_width, unexpected};
use crate::{
    ast::{SpinnerDef, Wedge},
    error::SemanticShapeError,
    parser::{Rule, SyntaxNode},
};

impl Builder {
    pub(super) fn spinner(&mut self, node: &SyntaxNode) -> ShapeResult<SpinnerDef> {
        let mut cur = Cursor::new(node);
        let id = cur.text("spinner id")?.into();
        let wedges = cur
            .nodes()
            .map(|w| {
                if w.rule != Rule::Wedge {
                    return Err(unexpected(w, "wedge"));
                }
                let mut wc = Cursor::new(w);
                Ok(Wedge {
                    text: wc.string("wedge text")?,
                    width: wc.node_if(|r| r == Rule::Width).map(wedge_width).transpose()?,
                    span: w.span,
                })
            })
            .collect::<ShapeResult<Vec<_>>>()?;
        if wedges.is_empty() {
            return Err(SemanticShapeError::EmptyBlock {
                what: "spinner wedges",
                span: node.span,
            });
        }
        Ok(SpinnerDef {
            id,
            wedges,
            span: node.span,
        })
    }
}
