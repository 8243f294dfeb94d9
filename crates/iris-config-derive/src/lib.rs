use heck::{ToKebabCase, ToShoutySnakeCase, ToSnakeCase};
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, DeriveInput};

/// Layered config loading for a plain struct: kdl config file, then
/// `IRIS_*` env vars, then global cli flags, each layer overriding the one
/// before it. Fields are `String` valued; `Option` fields are allowed to
/// stay unset, `#[config(default = "..")]` fills everything else.
#[proc_macro_derive(AppConfig, attributes(config))]
pub fn app_config_derive(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);

    let struct_name = &ast.ident;
    let namespace = syn::Ident::new(
        &struct_name.to_string().to_snake_case(),
        struct_name.span(),
    );

    let fields = match &ast.data {
        syn::Data::Struct(data_struct) => &data_struct.fields,
        _ => panic!("AppConfig can only be derived for structs"),
    };

    let mut try_gen = Vec::new();
    let mut field_gen = Vec::new();
    let mut cli_gen = Vec::new();
    let mut cli_args_gen = Vec::new();
    let mut env_gen = Vec::new();
    let mut config_gen = Vec::new();

    for field in fields {
        let field_name = field
            .ident
            .as_ref()
            .expect("AppConfig fields must be named");
        let inner_type = option_inner(&field.ty);
        let value_type = inner_type.unwrap_or(&field.ty);

        try_gen.push(match (inner_type.is_some(), config_default(field)) {
            (true, None) => quote! {
                #field_name: value.#field_name,
            },
            (true, Some(_)) => panic!("a default on an Option field has no effect"),
            (false, Some(default)) => quote! {
                #field_name: value.#field_name.unwrap_or_else(|| #default.into()),
            },
            (false, None) => quote! {
                #field_name: value.#field_name.ok_or(::anyhow::anyhow!(
                    "expected {} to be set",
                    stringify!(#field_name)
                ))?,
            },
        });

        field_gen.push(quote! {
            pub #field_name: Option<#value_type>,
        });

        cli_gen.push(quote! {
            if let Some(#field_name) = matches.remove_one::<#value_type>(stringify!(#field_name)) {
                s.#field_name = Some(#field_name);
            }
        });

        let long_flag = field_name.to_string().to_kebab_case();
        cli_args_gen.push(quote! {
            .arg(
                ::clap::Arg::new(stringify!(#field_name))
                    .long(#long_flag)
                    .action(::clap::ArgAction::Set)
                    .help_heading("Config")
                    .global(true)
            )
        });

        let env_name = format!("IRIS_{}", field_name.to_string().to_shouty_snake_case());
        env_gen.push(quote! {
            if let Ok(item) = ::std::env::var(#env_name) {
                self.#field_name = Some(item);
            }
        });

        config_gen.push(quote! {
            if let Some(item) = config
                .get(stringify!(#field_name))
                .and_then(|node| node.entries().first())
                .map(|entry| entry.value())
            {
                ::tracing::debug!("config file sets {}", stringify!(#field_name));
                self.#field_name = item.as_string().map(|value| value.to_string());
            }
        });
    }

    let try_gen = try_gen.into_iter().collect::<TokenStream2>();
    let field_gen = field_gen.into_iter().collect::<TokenStream2>();
    let cli_gen = cli_gen.into_iter().collect::<TokenStream2>();
    let cli_args_gen = cli_args_gen.into_iter().collect::<TokenStream2>();
    let env_gen = env_gen.into_iter().collect::<TokenStream2>();
    let config_gen = config_gen.into_iter().collect::<TokenStream2>();

    let expanded = quote! {
        impl #struct_name {
            pub fn from(conf: #namespace::#struct_name) -> ::anyhow::Result<Self> {
                use ::anyhow::Context;

                let c = conf.try_into().context("failed to resolve configuration")?;

                Ok(c)
            }
        }

        impl TryFrom<#namespace::#struct_name> for #struct_name {
            type Error = ::anyhow::Error;

            fn try_from(value: #namespace::#struct_name) -> Result<Self, Self::Error> {
                Ok(Self {
                    #try_gen
                })
            }
        }

        pub mod #namespace {
            #[derive(Clone, Debug, Default)]
            pub struct #struct_name {
                #field_gen
            }

            impl ::clap::FromArgMatches for #struct_name {
                fn from_arg_matches(matches: &::clap::ArgMatches) -> Result<Self, ::clap::error::Error> {
                    let mut matches = matches.clone();
                    Self::from_arg_matches_mut(&mut matches)
                }

                fn from_arg_matches_mut(matches: &mut ::clap::ArgMatches) -> Result<Self, ::clap::error::Error> {
                    use ::iris_config::{ConfigFile, Env};

                    let mut s = Self::default();

                    let config = match matches.remove_one::<String>("config-file") {
                        Some(config_file) => ::std::path::PathBuf::from(config_file),
                        None => ::iris_config::config_file(),
                    };

                    if let Err(e) = s.set_from_config_file(&config) {
                        ::tracing::debug!("no config file applied: {e}");
                    }
                    if let Err(e) = s.set_from_env() {
                        ::tracing::warn!("failed to read config from env: {e}");
                    }

                    #cli_gen

                    Ok(s)
                }

                fn update_from_arg_matches(&mut self, matches: &::clap::ArgMatches) -> Result<(), ::clap::error::Error> {
                    let mut matches = matches.clone();
                    self.update_from_arg_matches_mut(&mut matches)
                }

                fn update_from_arg_matches_mut(&mut self, matches: &mut ::clap::ArgMatches) -> Result<(), ::clap::error::Error> {
                    *self = Self::from_arg_matches_mut(matches)?;

                    Ok(())
                }
            }

            impl ::clap::Args for #struct_name {
                fn augment_args(cmd: ::clap::Command) -> ::clap::Command {
                    cmd.arg(
                        ::clap::Arg::new("config-file")
                            .long("config-file")
                            .action(::clap::ArgAction::Set)
                            .help_heading("Config")
                            .global(true)
                    )
                    #cli_args_gen
                }

                fn augment_args_for_update(cmd: ::clap::Command) -> ::clap::Command {
                    Self::augment_args(cmd)
                }
            }

            impl ::iris_config::Env for #struct_name {
                fn set_from_env(&mut self) -> Result<(), ::iris_config::EnvError> {
                    #env_gen

                    Ok(())
                }
            }

            impl ::iris_config::ConfigFile for #struct_name {
                fn set_from_config_file(&mut self, config_file: &::std::path::Path) -> Result<(), ::iris_config::ConfigFileError> {
                    use ::anyhow::Context;

                    ::tracing::trace!("looking for kdl config at: {}", config_file.display());
                    let file_content = ::std::fs::read_to_string(config_file)
                        .context("failed to read config file")
                        .map_err(::iris_config::ConfigFileError::ConfigFileError)?;

                    let doc: ::kdl::KdlDocument = file_content
                        .parse()
                        .context("failed to parse kdl config file")
                        .map_err(::iris_config::ConfigFileError::ConfigFileError)?;

                    if let Some(config) = doc.get("config") {
                        if let Some(config) = config.children() {
                            #config_gen
                        }
                    }

                    Ok(())
                }
            }
        }
    };

    TokenStream::from(expanded)
}

fn option_inner(ty: &syn::Type) -> Option<&syn::Type> {
    let path = match ty {
        syn::Type::Path(path) => path,
        _ => return None,
    };
    let last = path.path.segments.last()?;
    if last.ident != "Option" {
        return None;
    }

    match &last.arguments {
        syn::PathArguments::AngleBracketed(args) => match args.args.first() {
            Some(syn::GenericArgument::Type(inner)) => Some(inner),
            _ => None,
        },
        _ => None,
    }
}

fn config_default(field: &syn::Field) -> Option<String> {
    let mut default = None;

    for attr in &field.attrs {
        if !attr.path().is_ident("config") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("default") {
                let value: syn::LitStr = meta.value()?.parse()?;
                default = Some(value.value());
                return Ok(());
            }

            Err(meta.error("unsupported config attribute"))
        })
        .expect("config attribute takes the form #[config(default = \"..\")]");
    }

    default
}
