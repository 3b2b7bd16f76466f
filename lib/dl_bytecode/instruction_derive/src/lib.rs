// allowing panics since this is the standard way to show an
// error message from a proc-macro derive crate.
#![allow(clippy::panic)]

//! This crate introduces a proc macro derive building the opcode table of
//! the register VM instruction set from attributes placed on an enum.
//!
//! Each variant declares its opcode byte, its mnemonic, its operand layout
//! (the instruction format, which also gives its size in 16-bit code units)
//! and whether it may throw. The derive produces the corresponding
//! `Instruction` implementation, plus an `operands` accessor listing the
//! variant fields in declaration order so that format-driven writers and
//! printers do not need to destructure every variant.

extern crate proc_macro;

use proc_macro::TokenStream;
use proc_macro2::Span;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    parse_macro_input, Attribute, Data, DataEnum, DeriveInput, Expr, Fields, Ident, Lit, LitBool,
    LitInt, LitStr, Meta, MetaNameValue, NestedMeta, Variant,
};

/// The `Instruction` proc macro derive.
///
/// Recognized attributes:
/// - `opcode`: the opcode byte (payload pseudo-instructions share `0x00`),
/// - `mnemonic`: the name used when printing instructions,
/// - `format`: the operand layout (e.g. `"22t"`), or `"payload"` for
///   variable-length pseudo-instructions, which then need a `size` attribute
///   holding an expression over the variant named fields,
/// - `can_throw`: the instruction may raise an exception (default: `false`).
///
/// # Example
///
/// ```rust,ignore
/// #[derive(instruction_derive::Instruction)]
/// pub enum Instr {
///     #[instruction(opcode = 0x01, mnemonic = "move", format = "12x")]
///     Move(Reg, Reg),
/// }
/// ```
#[proc_macro_derive(Instruction, attributes(instruction))]
pub fn instruction_derive(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);
    let Data::Enum(data) = &ast.data else {
        panic!("#[derive(Instruction)] is only defined for enums")
    };
    derive_instruction_impl(&ast.ident, data).into()
}

fn derive_instruction_impl(name: &Ident, data: &DataEnum) -> TokenStream2 {
    let opcode_matches = data.variants.iter().map(|variant| opcode_match(name, variant));
    let mnemonic_matches = data.variants.iter().map(|variant| mnemonic_match(name, variant));
    let format_matches = data.variants.iter().map(|variant| format_match(name, variant));
    let size_matches = data.variants.iter().map(|variant| size_match(name, variant));
    let canthrow_matches = data.variants.iter().map(|variant| canthrow_match(name, variant));
    let operands_matches = data.variants.iter().map(|variant| operands_match(name, variant));

    quote! {
        impl Instruction for #name {
            fn opcode(&self) -> u8 {
                match self {
                    #(#opcode_matches)*
                }
            }

            fn mnemonic(&self) -> &'static str {
                match self {
                    #(#mnemonic_matches)*
                }
            }

            fn format(&self) -> Format {
                match self {
                    #(#format_matches)*
                }
            }

            fn size(&self) -> usize {
                match self {
                    #(#size_matches)*
                }
            }

            fn can_throw(&self) -> bool {
                match self {
                    #(#canthrow_matches)*
                }
            }

            fn operands(&self) -> Vec<Operand> {
                match self {
                    #(#operands_matches)*
                }
            }
        }
    }
}

fn opcode_match(name: &Ident, variant: &Variant) -> TokenStream2 {
    let ident = &variant.ident;
    let fields = anonymous_fields_pattern(variant);
    let opcode = get_instruction_int_value(&variant.attrs, "opcode");

    quote! {
        #name::#ident #fields => #opcode,
    }
}

fn mnemonic_match(name: &Ident, variant: &Variant) -> TokenStream2 {
    let ident = &variant.ident;
    let fields = anonymous_fields_pattern(variant);
    let mnemonic = get_instruction_string_value(&variant.attrs, "mnemonic");

    quote! {
        #name::#ident #fields => #mnemonic,
    }
}

fn format_match(name: &Ident, variant: &Variant) -> TokenStream2 {
    let ident = &variant.ident;
    let fields = anonymous_fields_pattern(variant);
    let format = get_instruction_string_value(&variant.attrs, "format").value();
    let format_ident = if format == "payload" {
        Ident::new("Payload", Span::call_site())
    } else {
        Ident::new(&format!("F{format}"), Span::call_site())
    };

    quote! {
        #name::#ident #fields => Format::#format_ident,
    }
}

fn size_match(name: &Ident, variant: &Variant) -> TokenStream2 {
    let ident = &variant.ident;
    let fields = named_fields_pattern(variant);
    let format = get_instruction_string_value(&variant.attrs, "format").value();
    let size: Expr = if format == "payload" {
        let size_attr = get_instruction_string_value(&variant.attrs, "size");
        size_attr.parse().expect("size expression")
    } else if let Some(units) = format.chars().next().and_then(|c| c.to_digit(10)) {
        let lit = LitInt::new(&units.to_string(), Span::call_site());
        syn::parse_quote!(#lit)
    } else {
        panic!("bad 'format' attribute");
    };

    quote! {
        #name::#ident #fields => #size,
    }
}

fn canthrow_match(name: &Ident, variant: &Variant) -> TokenStream2 {
    let ident = &variant.ident;
    let fields = anonymous_fields_pattern(variant);
    let canthrow = get_instruction_bool_value(&variant.attrs, "can_throw");

    quote! {
        #name::#ident #fields => #canthrow,
    }
}

fn operands_match(name: &Ident, variant: &Variant) -> TokenStream2 {
    let ident = &variant.ident;
    match &variant.fields {
        Fields::Unnamed(flds) => {
            let params: Vec<_> = (0..flds.unnamed.len())
                .map(|i| Ident::new(&format!("_{i}"), Span::call_site()))
                .collect();
            quote! {
                #name::#ident(#(#params),*) => vec![#(Operand::from(#params.clone())),*],
            }
        }
        Fields::Named(_) => quote! {
            #name::#ident { .. } => Vec::new(),
        },
        Fields::Unit => quote! {
            #name::#ident => Vec::new(),
        },
    }
}

fn anonymous_fields_pattern(variant: &Variant) -> TokenStream2 {
    match &variant.fields {
        Fields::Named(_) => quote! { { .. } },
        Fields::Unnamed(_) => quote! { (..) },
        Fields::Unit => quote! {},
    }
}

fn named_fields_pattern(variant: &Variant) -> TokenStream2 {
    match &variant.fields {
        Fields::Named(flds) => {
            let params: Vec<_> = flds
                .named
                .iter()
                .map(|n| n.ident.clone().expect("identifier"))
                .collect();
            quote! {{ #(#params),* }}
        }
        Fields::Unnamed(_) => quote! { (..) },
        Fields::Unit => quote! {},
    }
}

fn get_instruction_values(attr: &Attribute) -> Vec<MetaNameValue> {
    if !attr.path.is_ident("instruction") {
        return Vec::new();
    }

    match attr.parse_meta() {
        Ok(Meta::NameValue(v)) => vec![v],
        Ok(Meta::List(meta)) => meta
            .nested
            .into_iter()
            .map(|nested| match nested {
                NestedMeta::Meta(Meta::Path(path)) => {
                    let span = path
                        .segments
                        .first()
                        .expect("path first segment")
                        .ident
                        .span();
                    MetaNameValue {
                        path,
                        eq_token: syn::token::Eq { spans: [span] },
                        lit: Lit::Bool(LitBool { value: true, span }),
                    }
                }
                NestedMeta::Meta(Meta::NameValue(n)) => n,
                _ => panic!("expected #[instruction(...)]"),
            })
            .collect(),
        _ => panic!("expected #[instruction(...)]"),
    }
}

fn find_instruction_value(attrs: &[Attribute], name: &str) -> Option<Lit> {
    attrs
        .iter()
        .flat_map(get_instruction_values)
        .find(|name_value| name_value.path.is_ident(name))
        .map(|name_value| name_value.lit)
}

fn get_instruction_string_value(attrs: &[Attribute], name: &str) -> LitStr {
    match find_instruction_value(attrs, name) {
        Some(Lit::Str(s)) => s,
        Some(_) => panic!("expected string for '{name}' value"),
        None => panic!("missing '{name}' attribute"),
    }
}

fn get_instruction_int_value(attrs: &[Attribute], name: &str) -> LitInt {
    match find_instruction_value(attrs, name) {
        Some(Lit::Int(i)) => LitInt::new(&format!("{}u8", i.base10_digits()), i.span()),
        Some(_) => panic!("expected integer for '{name}' value"),
        None => panic!("missing '{name}' attribute"),
    }
}

fn get_instruction_bool_value(attrs: &[Attribute], name: &str) -> LitBool {
    match find_instruction_value(attrs, name) {
        Some(Lit::Bool(b)) => b,
        Some(_) => panic!("expected bool for '{name}' value"),
        None => LitBool {
            value: false,
            span: Span::call_site(),
        },
    }
}
