//! The Procedure Converter (spec §4.5).
//!
//! Hardware procedures read like ordinary control flow — `if`/`else if`/
//! `else` on conditions built from module ports, `&&`/`||`/`!` combining
//! them — but must end up as calls into [`firc_hir::module::ModuleBuilder`]
//! (`when`/`else_when`/`otherwise`, `Expr::and_expr`/`or_expr`/`not_expr`),
//! since a hardware `if` does not choose one branch at elaboration time, it
//! describes a multiplexer.
//!
//! Rust cannot overload `&&`/`||` (they stay short-circuit on `bool`
//! regardless of the operand type), so there is no way to make ordinary
//! boolean syntax produce an `Expr` by trait implementation alone — the
//! same wall the original Python implementation hit with its `and`/`or`/
//! `not` keywords, which it solved with an `ast.NodeTransformer`
//! (`_convert.py`). This crate is that same rewrite expressed as a
//! `syn`/`quote` attribute macro instead of an AST pass over Python source.
//!
//! `#[procedure]` is applied to a free function whose first parameter is
//! the module builder; every `if` chain and boolean connective in its body
//! is rewritten in place.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::visit::Visit;
use syn::visit_mut::VisitMut;
use syn::{parse_macro_input, BinOp, Block, Expr, ExprField, ItemFn, Pat, Stmt, UnOp};

#[proc_macro_attribute]
pub fn procedure(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let mut func = parse_macro_input!(item as ItemFn);
    let builder = match first_param_ident(&func) {
        Some(ident) => ident,
        None => {
            return syn::Error::new_spanned(
                &func.sig,
                "#[procedure] functions must take the module builder as their first parameter",
            )
            .to_compile_error()
            .into();
        }
    };
    let mut rewriter = Rewriter { builder };
    rewriter.visit_block_mut(&mut func.block);
    quote!(#func).into()
}

fn first_param_ident(func: &ItemFn) -> Option<syn::Ident> {
    let first = func.sig.inputs.first()?;
    match first {
        syn::FnArg::Typed(pat_type) => match pat_type.pat.as_ref() {
            Pat::Ident(pat_ident) => Some(pat_ident.ident.clone()),
            _ => None,
        },
        syn::FnArg::Receiver(_) => None,
    }
}

/// Detects whether an expression contains an attribute access rooted at
/// the procedure's first parameter (`builder.en`, `builder.cnt.valid`, …) —
/// a reference to a data member (port/wire/register/instance), per spec
/// §4.5 #1. Presence of at least one such access anywhere in the
/// expression selects the hardware rewrite path; its absence means the
/// expression is built from pure host values and must be left alone.
struct BuilderAccess<'a> {
    builder: &'a syn::Ident,
    found: bool,
}

impl<'a, 'ast> Visit<'ast> for BuilderAccess<'a> {
    fn visit_expr_field(&mut self, node: &'ast ExprField) {
        if let Expr::Path(path) = node.base.as_ref() {
            if path.path.is_ident(self.builder) {
                self.found = true;
            }
        }
        syn::visit::visit_expr_field(self, node);
    }
}

fn is_hardware_condition(expr: &Expr, builder: &syn::Ident) -> bool {
    let mut detector = BuilderAccess { builder, found: false };
    detector.visit_expr(expr);
    detector.found
}

struct Rewriter {
    builder: syn::Ident,
}

impl VisitMut for Rewriter {
    fn visit_block_mut(&mut self, block: &mut Block) {
        for stmt in block.stmts.iter_mut() {
            syn::visit_mut::visit_stmt_mut(self, stmt);
        }
        let mut rewritten = Vec::with_capacity(block.stmts.len());
        for stmt in block.stmts.drain(..) {
            match stmt {
                Stmt::Expr(Expr::If(expr_if), _semi) if is_hardware_condition(&expr_if.cond, &self.builder) => {
                    let call = self.build_when_chain(expr_if);
                    rewritten.push(Stmt::Expr(Expr::Verbatim(call), Some(Default::default())));
                }
                other => rewritten.push(other),
            }
        }
        block.stmts = rewritten;
    }

    fn visit_expr_mut(&mut self, expr: &mut Expr) {
        syn::visit_mut::visit_expr_mut(self, expr);
        match expr {
            Expr::Binary(bin) if matches!(bin.op, BinOp::And(_)) && is_hardware_condition(expr, &self.builder) => {
                let (lhs, rhs) = (&bin.left, &bin.right);
                *expr = syn::parse_quote!(::firc_hir::Expr::and_expr(#lhs, #rhs));
            }
            Expr::Binary(bin) if matches!(bin.op, BinOp::Or(_)) && is_hardware_condition(expr, &self.builder) => {
                let (lhs, rhs) = (&bin.left, &bin.right);
                *expr = syn::parse_quote!(::firc_hir::Expr::or_expr(#lhs, #rhs));
            }
            Expr::Unary(un) if matches!(un.op, UnOp::Not(_)) && is_hardware_condition(expr, &self.builder) => {
                let operand = &un.expr;
                *expr = syn::parse_quote!(::firc_hir::Expr::not_expr(#operand));
            }
            _ => {}
        }
    }
}

impl Rewriter {
    /// Flattens an `if`/`else if`/.../`else` chain into a single
    /// `builder.when(cond, |builder| {..})?.else_when(..)?.otherwise(..)?`
    /// expression, the same merge `_convert.py::_Replacer.visit_If`
    /// performs by checking whether the sole statement of an `orelse`
    /// block is itself a chained `with`.
    fn build_when_chain(&self, expr_if: syn::ExprIf) -> TokenStream2 {
        let builder = &self.builder;
        let cond = &expr_if.cond;
        let then_block = &expr_if.then_branch;
        let mut chain = quote!(#builder.when(#cond, |#builder| #then_block)?);

        let mut else_branch = expr_if.else_branch;
        loop {
            match else_branch {
                Some((_, boxed)) => match *boxed {
                    Expr::If(inner) => {
                        let cond = &inner.cond;
                        let then_block = &inner.then_branch;
                        chain = quote!(#chain.else_when(#cond, |#builder| #then_block)?);
                        else_branch = inner.else_branch;
                    }
                    Expr::Block(block_expr) => {
                        let block = &block_expr.block;
                        chain = quote!(#chain.otherwise(|#builder| #block)?);
                        break;
                    }
                    other => {
                        chain = quote!(#chain.otherwise(|#builder| { #other })?);
                        break;
                    }
                },
                None => break,
            }
        }
        chain
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use syn::parse_quote;

    #[test]
    fn rewrites_boolean_connectives() {
        let mut expr: Expr = parse_quote!(m.a && m.b || !m.c);
        let mut rewriter = Rewriter { builder: syn::parse_str("m").unwrap() };
        rewriter.visit_expr_mut(&mut expr);
        let rendered = quote!(#expr).to_string();
        assert_eq!(
            rendered,
            quote!(::firc_hir::Expr::or_expr(
                ::firc_hir::Expr::and_expr(m.a, m.b),
                ::firc_hir::Expr::not_expr(m.c)
            ))
            .to_string()
        );
    }

    #[test]
    fn leaves_pure_host_connectives_unrewritten() {
        let mut expr: Expr = parse_quote!(flag_a && flag_b || !flag_c);
        let mut rewriter = Rewriter { builder: syn::parse_str("m").unwrap() };
        let before = quote!(#expr).to_string();
        rewriter.visit_expr_mut(&mut expr);
        assert_eq!(quote!(#expr).to_string(), before);
    }

    #[test]
    fn rewrites_if_on_hardware_condition() {
        let mut block: Block = parse_quote! {{
            if m.en {
                m.connect(x, one);
            }
        }};
        let mut rewriter = Rewriter { builder: syn::parse_str("m").unwrap() };
        rewriter.visit_block_mut(&mut block);
        let rendered = quote!(#block).to_string();
        assert!(rendered.contains("m . when"));
    }

    #[test]
    fn leaves_if_on_pure_host_value_unrewritten() {
        let mut block: Block = parse_quote! {{
            if some_flag {
                do_something();
            }
        }};
        let mut rewriter = Rewriter { builder: syn::parse_str("m").unwrap() };
        rewriter.visit_block_mut(&mut block);
        let rendered = quote!(#block).to_string();
        assert!(rendered.contains("if some_flag"));
        assert!(!rendered.contains("when"));
    }

    #[test]
    fn flattens_if_else_if_else_chain() {
        let expr_if: syn::ExprIf = parse_quote! {
            if a {
                m.connect(x, one);
            } else if b {
                m.connect(x, two);
            } else {
                m.connect(x, zero);
            }
        };
        let rewriter = Rewriter { builder: syn::parse_str("m").unwrap() };
        let chain = rewriter.build_when_chain(expr_if).to_string();
        let expected = quote! {
            m.when(a, |m| { m.connect(x, one); })?
                .else_when(b, |m| { m.connect(x, two); })?
                .otherwise(|m| { m.connect(x, zero); })?
        }
        .to_string();
        assert_eq!(chain, expected);
    }

    #[test]
    fn if_without_else_has_no_otherwise_branch() {
        let expr_if: syn::ExprIf = parse_quote! {
            if a {
                m.connect(x, one);
            }
        };
        let rewriter = Rewriter { builder: syn::parse_str("m").unwrap() };
        let chain = rewriter.build_when_chain(expr_if).to_string();
        let expected = quote! {
            m.when(a, |m| { m.connect(x, one); })?
        }
        .to_string();
        assert_eq!(chain, expected);
    }
}
