//! Internal macros for craig

extern crate proc_macro;
extern crate proc_macro2;

use quote::quote;

/// Default implementation of [HeapSpace](../craig_common/memory/trait.HeapSpace.html).
/// Use by adding `#[derive(HeapSpace)]` to your struct.
///
/// The heap space of a struct is the sum of the heap space of its fields,
/// named or positional.
#[proc_macro_derive(HeapSpace)]
pub fn heap_space(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let ast: syn::DeriveInput = syn::parse(input).unwrap();
    let type_name = ast.ident;
    let (impl_generics, type_generics, where_clause) = ast.generics.split_for_impl();
    let data_struct = match ast.data {
        syn::Data::Struct(data_struct) => data_struct,
        syn::Data::Enum(_) => panic!("HeapSpace cannot be derived for enums"),
        syn::Data::Union(_) => panic!("HeapSpace cannot be derived for unions"),
    };
    let block = data_struct
        .fields
        .iter()
        .enumerate()
        .map(|(position, field)| match &field.ident {
            Some(name) => quote!(self.#name.heap_space()),
            None => {
                let index = syn::Index::from(position);
                quote!(self.#index.heap_space())
            }
        })
        .fold(quote!(0), |a, b| quote!(#a + #b));
    let implementation = quote!(
        impl #impl_generics
        HeapSpace for #type_name #type_generics #where_clause {
            fn heap_space(&self) -> usize {
                #block
            }
        }
    );
    implementation.into()
}
