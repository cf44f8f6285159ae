use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Fields, LitStr, Type};

/// Derive macro for unit config parameter declarations.
///
/// Generates two methods on the annotated struct:
///
/// - `config_params() -> Vec<ConfigParam>`: parameter declarations (describe-config).
/// - `from_config(&ConfigValues) -> Result<Self, PluginError>`: reads typed values.
///
/// The struct must implement `Default` (defaults are used for non-required params).
///
/// # Example
///
/// ```ignore
/// #[derive(ConfigParams, Default)]
/// pub struct MyConfig {
///     #[param(rename = "keyField", importance = "high", required, description = "Source field")]
///     pub key_field: String,
///
///     #[param(importance = "low", description = "Drop the key")]
///     pub drop_key: bool,
/// }
/// ```
///
/// Attributes:
/// - `importance`: `"high"`, `"medium"` or `"low"` (required).
/// - `description`: free text (required).
/// - `required`: no default; absence is a config error.
/// - `rename`: option name as seen by the host (defaults to the field name).
/// - `non_empty`: `String` only; `""` is a config error.
///
/// Supported field types: `bool`, `i64`, `u64`, `usize`, `f64`, `String`.
#[proc_macro_derive(ConfigParams, attributes(param))]
pub fn derive_config_params(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match derive_impl(&input) {
        Ok(tokens) => tokens,
        Err(e) => e.to_compile_error().into(),
    }
}

fn derive_impl(input: &DeriveInput) -> Result<TokenStream, syn::Error> {
    let name = &input.ident;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    name,
                    "ConfigParams only supports structs with named fields",
                ))
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                name,
                "ConfigParams only supports structs",
            ))
        }
    };

    let mut config_param_tokens = Vec::new();
    let mut from_config_tokens = Vec::new();

    for field in fields {
        let field_name = field.ident.as_ref().ok_or_else(|| {
            syn::Error::new_spanned(field, "expected named field")
        })?;
        let field_ty = &field.ty;

        // Parse #[param(...)] attribute.
        let mut importance_str: Option<String> = None;
        let mut description_str: Option<String> = None;
        let mut rename_str: Option<String> = None;
        let mut required = false;
        let mut non_empty = false;

        for attr in &field.attrs {
            if !attr.path().is_ident("param") {
                continue;
            }
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("importance") {
                    let value: LitStr = meta.value()?.parse()?;
                    importance_str = Some(value.value());
                } else if meta.path.is_ident("description") {
                    let value: LitStr = meta.value()?.parse()?;
                    description_str = Some(value.value());
                } else if meta.path.is_ident("rename") {
                    let value: LitStr = meta.value()?.parse()?;
                    rename_str = Some(value.value());
                } else if meta.path.is_ident("required") {
                    required = true;
                } else if meta.path.is_ident("non_empty") {
                    non_empty = true;
                } else {
                    return Err(meta.error("unknown param attribute"));
                }
                Ok(())
            })?;
        }

        let param_name = rename_str.unwrap_or_else(|| field_name.to_string());

        let importance_str = importance_str.ok_or_else(|| {
            syn::Error::new_spanned(field_name, "missing #[param(importance = \"...\")]")
        })?;
        let description_str = description_str.ok_or_else(|| {
            syn::Error::new_spanned(field_name, "missing #[param(description = \"...\")]")
        })?;

        let importance_expr = match importance_str.as_str() {
            "high" => quote! { switchyard_api::config::ParamImportance::High },
            "medium" => quote! { switchyard_api::config::ParamImportance::Medium },
            "low" => quote! { switchyard_api::config::ParamImportance::Low },
            _ => {
                return Err(syn::Error::new_spanned(
                    field_name,
                    format!(
                        "unknown importance '{importance_str}' (expected 'high', 'medium' or 'low')"
                    ),
                ))
            }
        };

        let ty_name = type_ident_name(field_ty).ok_or_else(|| {
            syn::Error::new_spanned(field_ty, "unsupported type for ConfigParams")
        })?;

        if non_empty && ty_name != "String" {
            return Err(syn::Error::new_spanned(
                field_name,
                "non_empty is only supported on String fields",
            ));
        }

        let missing = quote! {
            switchyard_api::error::PluginError::config(
                format!("missing required parameter '{}'", #param_name)
            )
        };

        let (param_type_expr, default_expr, getter_expr) = match ty_name.as_str() {
            "u64" | "usize" => {
                let cast = if ty_name == "usize" { quote! { as usize } } else { quote! {} };
                let default_cast = if ty_name == "usize" { quote! { as u64 } } else { quote! {} };
                (
                    quote! { switchyard_api::config::ParamType::U64 },
                    quote! { Some(switchyard_api::config::ParamValue::U64(__defaults.#field_name #default_cast)) },
                    if required {
                        quote! {
                            result.#field_name = __config.get_u64(#param_name)
                                .ok_or_else(|| #missing)? #cast;
                        }
                    } else {
                        quote! {
                            if let Some(v) = __config.get_u64(#param_name) {
                                result.#field_name = v #cast;
                            }
                        }
                    },
                )
            }
            "i64" | "f64" | "bool" => {
                let (param_type, variant, getter) = match ty_name.as_str() {
                    "i64" => (quote! { I64 }, quote! { I64 }, quote! { get_i64 }),
                    "f64" => (quote! { F64 }, quote! { F64 }, quote! { get_f64 }),
                    _ => (quote! { Bool }, quote! { Bool }, quote! { get_bool }),
                };
                (
                    quote! { switchyard_api::config::ParamType::#param_type },
                    quote! { Some(switchyard_api::config::ParamValue::#variant(__defaults.#field_name)) },
                    if required {
                        quote! {
                            result.#field_name = __config.#getter(#param_name)
                                .ok_or_else(|| #missing)?;
                        }
                    } else {
                        quote! {
                            if let Some(v) = __config.#getter(#param_name) {
                                result.#field_name = v;
                            }
                        }
                    },
                )
            }
            "String" => {
                let non_empty_check = if non_empty {
                    quote! {
                        if result.#field_name.is_empty() {
                            return Err(switchyard_api::error::PluginError::config(
                                format!("parameter '{}': string must be non-empty", #param_name)
                            ));
                        }
                    }
                } else {
                    quote! {}
                };
                (
                    quote! { switchyard_api::config::ParamType::Str },
                    quote! { Some(switchyard_api::config::ParamValue::Str(__defaults.#field_name.clone())) },
                    if required {
                        quote! {
                            result.#field_name = __config.get_str(#param_name)
                                .ok_or_else(|| #missing)?
                                .to_string();
                            #non_empty_check
                        }
                    } else {
                        quote! {
                            if let Some(v) = __config.get_str(#param_name) {
                                result.#field_name = v.to_string();
                            }
                            #non_empty_check
                        }
                    },
                )
            }
            _ => {
                return Err(syn::Error::new_spanned(
                    field_ty,
                    format!(
                        "unsupported type '{ty_name}' (expected u64, i64, f64, bool, String, usize)"
                    ),
                ))
            }
        };

        let default_value = if required {
            quote! { None }
        } else {
            default_expr
        };

        config_param_tokens.push(quote! {
            switchyard_api::config::ConfigParam {
                name: #param_name.to_string(),
                param_type: #param_type_expr,
                importance: #importance_expr,
                required: #required,
                non_empty: #non_empty,
                default: #default_value,
                description: #description_str.to_string(),
            }
        });

        from_config_tokens.push(getter_expr);
    }

    let expanded = quote! {
        impl #name {
            pub fn config_params() -> Vec<switchyard_api::config::ConfigParam> {
                let __defaults = Self::default();
                let _ = &__defaults;
                vec![
                    #(#config_param_tokens),*
                ]
            }

            pub fn from_config(
                __config: &switchyard_api::config::ConfigValues,
            ) -> Result<Self, switchyard_api::error::PluginError> {
                let mut result = Self::default();
                #(#from_config_tokens)*
                Ok(result)
            }
        }
    };

    Ok(TokenStream::from(expanded))
}

/// Extract the last path segment ident name from a type (e.g. `u64`, `String`).
fn type_ident_name(ty: &Type) -> Option<String> {
    if let Type::Path(type_path) = ty {
        type_path
            .path
            .segments
            .last()
            .map(|seg| seg.ident.to_string())
    } else {
        None
    }
}
