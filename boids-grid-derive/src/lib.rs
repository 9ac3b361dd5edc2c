//! Derive macros for the boids-grid spatial hash.
//!
//! This crate provides [`Positioned`], which implements
//! `boids_grid::Positioned` for particle structs and enums so they can be fed
//! to `SpatialHash::build` directly.
//!
//! # Usage
//!
//! The macro is re-exported from the main `boids_grid` crate. You don't need
//! to add this crate directly:
//!
//! ```ignore
//! use boids_grid::prelude::*;
//!
//! #[derive(Positioned, Clone)]
//! struct Boid {
//!     position: Vec3,
//!     velocity: Vec3,
//! }
//! ```
//!
//! # Finding the position
//!
//! - A field marked `#[position]` wins.
//! - Otherwise a field named `position` is used.
//! - Tuple structs must mark their field.
//!
//! The field's type must itself implement `Positioned` (`Vec3`, `[f32; 3]`,
//! or another derived type).

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Field, Fields, Ident, Index, Member, Variant};

/// Derive macro for `boids_grid::Positioned`.
///
/// # Example
///
/// ```ignore
/// #[derive(Positioned, Clone)]
/// struct Boid {
///     position: Vec3,
///     velocity: Vec3,
/// }
///
/// #[derive(Positioned, Clone)]
/// struct Tagged(u32, #[position] [f32; 3]);
///
/// #[derive(Positioned, Clone)]
/// enum Agent {
///     Boid { position: Vec3, velocity: Vec3 },
///     Predator { #[position] at: Vec3, hunger: f32 },
/// }
/// ```
///
/// # Panics
///
/// The macro panics at compile time if:
/// - No position field can be found (on the struct or on any enum variant)
/// - More than one field is marked `#[position]`
/// - Applied to a union
#[proc_macro_derive(Positioned, attributes(position))]
pub fn derive_positioned(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let body = match &input.data {
        Data::Struct(data) => {
            let access = position_access(&data.fields, &name.to_string());
            quote! { boids_grid::Positioned::position(&self.#access) }
        }
        Data::Enum(data) => {
            if data.variants.is_empty() {
                panic!("Positioned derive needs at least one variant on '{}'", name);
            }
            let arms = data.variants.iter().map(|variant| generate_variant_arm(name, variant));
            quote! {
                match self {
                    #(#arms)*
                }
            }
        }
        Data::Union(_) => panic!("Positioned derive does not support unions"),
    };

    let expanded = quote! {
        impl #impl_generics boids_grid::Positioned for #name #ty_generics #where_clause {
            #[inline]
            fn position(&self) -> boids_grid::Vec3 {
                #body
            }
        }
    };

    TokenStream::from(expanded)
}

/// Match arm binding a variant's position field and forwarding to it.
fn generate_variant_arm(name: &Ident, variant: &Variant) -> proc_macro2::TokenStream {
    let variant_name = &variant.ident;
    let context = format!("{}::{}", name, variant_name);
    let access = position_access(&variant.fields, &context);
    let pattern = match &variant.fields {
        Fields::Named(_) => quote! { #name::#variant_name { #access: __position, .. } },
        Fields::Unnamed(fields) => {
            let slots = (0..fields.unnamed.len()).map(|i| tuple_slot(&access, i));
            quote! { #name::#variant_name ( #(#slots),* ) }
        }
        Fields::Unit => unreachable!(),
    };
    quote! { #pattern => boids_grid::Positioned::position(__position), }
}

/// Binding for slot `i` of a tuple variant: the position or a wildcard.
fn tuple_slot(access: &Member, i: usize) -> proc_macro2::TokenStream {
    match access {
        Member::Unnamed(index) if index.index as usize == i => quote! { __position },
        _ => quote! { _ },
    }
}

/// Field name or tuple index holding the position.
fn position_access(fields: &Fields, context: &str) -> Member {
    let marked: Vec<(usize, &Field)> = fields
        .iter()
        .enumerate()
        .filter(|(_, f)| f.attrs.iter().any(|a| a.path().is_ident("position")))
        .collect();

    if marked.len() > 1 {
        panic!("'{}' marks more than one field with #[position]", context);
    }

    if let Some((i, field)) = marked.first() {
        return match &field.ident {
            Some(ident) => Member::Named(ident.clone()),
            None => Member::Unnamed(Index::from(*i)),
        };
    }

    match fields {
        Fields::Named(named) => {
            let found = named
                .named
                .iter()
                .filter_map(|f| f.ident.as_ref())
                .find(|ident| *ident == "position");
            match found {
                Some(ident) => Member::Named(ident.clone()),
                None => panic!(
                    "'{}' must have a 'position' field or a field marked #[position]",
                    context
                ),
            }
        }
        Fields::Unnamed(_) => panic!("'{}' must mark its position field with #[position]", context),
        Fields::Unit => panic!("'{}' has no fields, so it has no position", context),
    }
}
