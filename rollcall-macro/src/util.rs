use syn::meta::ParseNestedMeta;
use syn::{Attribute, Expr, ExprLit, Lit, Token};

/// Collect all `#[doc = "..."]` lines of an item, strip the single leading
/// space rustdoc inserts and join them.
///
/// Returns `None` if there is no doc comment.
pub fn docstring(attributes: &[Attribute]) -> syn::Result<Option<String>> {
    let mut lines = vec![];

    for attr in attributes.iter().filter(|attr| attr.path().is_ident("doc")) {
        let Expr::Lit(ExprLit {
            lit: Lit::Str(lit), ..
        }) = &attr.meta.require_name_value()?.value
        else {
            continue;
        };

        let line = lit.value();
        match line.strip_prefix(' ') {
            Some(stripped) => lines.push(stripped.to_string()),
            None => lines.push(line),
        }
    }

    let joined = lines.join("\n");
    Ok(Some(joined).filter(|s| !s.is_empty()))
}

/// Consume the `= value` part of an argument we don't care about.
pub fn skip_value(meta: &ParseNestedMeta<'_>) -> syn::Result<()> {
    if meta.input.peek(Token![=]) {
        meta.value()?.parse::<Expr>()?;
    }
    Ok(())
}
