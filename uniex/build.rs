//! Build-time facade generation: read every spec under `specs/`, validate it, and emit
//! one module per exchange with one async method per endpoint plus introspection
//! accessors. The spec files stay the single source of truth; the runtime only carries
//! the parsed `Spec` and the shared `ExchangeClient`.

use std::{env, fmt::Write as _, fs, path::Path};
use uniex_spec::{Capability, Endpoint, Spec};

const RUST_KEYWORDS: &[&str] = &[
    "as", "async", "await", "box", "break", "const", "continue", "crate", "dyn", "else", "enum",
    "extern", "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move",
    "mut", "pub", "ref", "return", "self", "static", "struct", "super", "trait", "true", "type",
    "unsafe", "use", "where", "while", "yield",
];

fn main() {
    println!("cargo:rerun-if-changed=specs");
    println!("cargo:rerun-if-changed=data");

    let manifest_dir = env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR is set by cargo");
    let out_dir = env::var("OUT_DIR").expect("OUT_DIR is set by cargo");

    let specs_dir = Path::new(&manifest_dir).join("specs");
    let mut paths = fs::read_dir(&specs_dir)
        .expect("specs directory exists")
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|extension| extension == "json"))
        .collect::<Vec<_>>();
    paths.sort();

    let mut code = String::from(
        "// Generated by build.rs from specs/*.json. Do not edit.\n\n",
    );
    let mut generated = Vec::new();

    for path in &paths {
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .expect("spec file name is utf-8")
            .to_string();
        let raw = fs::read_to_string(path)
            .unwrap_or_else(|error| panic!("reading spec {file_name}: {error}"));
        let spec = uniex_spec::from_str(&raw)
            .unwrap_or_else(|error| panic!("spec {file_name} failed to load: {error}"));
        uniex_spec::validate(&spec)
            .unwrap_or_else(|error| panic!("spec {file_name} failed validation: {error}"));

        let struct_name = pascal_case(&spec.id);
        code.push_str(&generate_exchange(&spec, &struct_name, &file_name));
        generated.push(struct_name);
    }

    code.push_str(&generate_registry(&generated));

    fs::write(Path::new(&out_dir).join("exchanges.rs"), code)
        .expect("writing generated exchange facades");
}

fn pascal_case(id: &str) -> String {
    id.split(['_', '-'])
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

fn check_identifier(spec_id: &str, name: &str) {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && !RUST_KEYWORDS.contains(&name);
    if !valid {
        panic!("spec {spec_id}: {name} is not usable as a generated identifier");
    }
}

/// Positional parameter names for emulated methods without a backing endpoint record.
fn emulated_params(method: &str) -> Option<&'static [&'static str]> {
    Some(match method {
        "fetch_ticker" | "fetch_trading_fee" | "fetch_position" | "fetch_leverage"
        | "fetch_margin_mode" | "fetch_market_leverage_tiers" | "fetch_funding_rate"
        | "fetch_funding_interval" | "fetch_isolated_borrow_rate" => &["symbol"],
        "fetch_bids_asks" | "fetch_currencies" | "fetch_trading_limits" => &[],
        "fetch_transactions" | "fetch_deposits_withdrawals" => &["code", "since", "limit"],
        "fetch_transaction_fee" | "fetch_deposit_withdraw_fee" | "fetch_deposit_address" => {
            &["code"]
        }
        "fetch_open_orders" | "fetch_closed_orders" | "fetch_canceled_orders"
        | "fetch_canceled_and_closed_orders" | "fetch_my_trades" | "fetch_position_history" => {
            &["symbol", "since", "limit"]
        }
        "fetch_order" | "fetch_order_trades" => &["id", "symbol"],
        _ => return None,
    })
}

fn generate_exchange(spec: &Spec, struct_name: &str, file_name: &str) -> String {
    let mut out = String::new();

    writeln!(out, "/// {} unified exchange facade, generated from `specs/{file_name}`.", spec.name).unwrap();
    writeln!(out, "#[derive(Debug, Clone)]").unwrap();
    writeln!(out, "pub struct {struct_name} {{").unwrap();
    writeln!(out, "    client: std::sync::Arc<crate::client::ExchangeClient>,").unwrap();
    writeln!(out, "}}").unwrap();
    writeln!(out).unwrap();
    writeln!(out, "impl {struct_name} {{").unwrap();

    // Spec accessor: parsed once per process; build.rs already validated these bytes.
    writeln!(out, "    /// The exchange spec compiled into this build.").unwrap();
    writeln!(out, "    pub fn spec() -> &'static uniex_spec::Spec {{").unwrap();
    writeln!(out, "        static SPEC: std::sync::OnceLock<uniex_spec::Spec> = std::sync::OnceLock::new();").unwrap();
    writeln!(out, "        SPEC.get_or_init(|| {{").unwrap();
    writeln!(out, "            uniex_spec::from_str(include_str!(concat!(").unwrap();
    writeln!(out, "                env!(\"CARGO_MANIFEST_DIR\"),").unwrap();
    writeln!(out, "                \"/specs/{file_name}\"").unwrap();
    writeln!(out, "            )))").unwrap();
    writeln!(out, "            .expect(\"spec validated at build time\")").unwrap();
    writeln!(out, "        }})").unwrap();
    writeln!(out, "    }}").unwrap();
    writeln!(out).unwrap();

    out.push_str(&format!(
        r#"    pub fn new(transport: std::sync::Arc<dyn crate::transport::HttpTransport>) -> Self {{
        Self::with_config(transport, crate::config::RuntimeConfig::default())
    }}

    pub fn with_config(
        transport: std::sync::Arc<dyn crate::transport::HttpTransport>,
        config: crate::config::RuntimeConfig,
    ) -> Self {{
        Self {{
            client: std::sync::Arc::new(crate::client::ExchangeClient::with_config(
                std::sync::Arc::new(Self::spec().clone()),
                transport,
                config,
            )),
        }}
    }}

    /// Wrap an already-configured runtime client.
    pub fn from_client(client: std::sync::Arc<crate::client::ExchangeClient>) -> Self {{
        Self {{ client }}
    }}

    /// The shared runtime client behind this facade.
    pub fn client(&self) -> &std::sync::Arc<crate::client::ExchangeClient> {{
        &self.client
    }}

    pub fn endpoints(&self) -> &[uniex_spec::Endpoint] {{
        self.client.endpoints()
    }}

    pub fn signing(&self) -> &uniex_signing::SignConfig {{
        self.client.signing()
    }}

    pub fn classification(&self) -> uniex_spec::Classification {{
        self.client.classification()
    }}

    /// Signed passthrough using this exchange's signing config.
    pub async fn request(
        &self,
        method: uniex_signing::Method,
        path: &str,
        options: crate::config::CallOptions,
        credentials: Option<&uniex_signing::Credentials>,
    ) -> Result<serde_json::Value, crate::error::ExchangeError> {{
        self.client.request(method, path, options, credentials).await
    }}

    /// Unsigned escape hatch: no signing, no url rewriting.
    pub async fn raw_request(
        &self,
        method: uniex_signing::Method,
        url: &str,
        headers: Vec<(String, String)>,
        body: Option<String>,
        options: crate::config::CallOptions,
    ) -> Result<serde_json::Value, crate::error::ExchangeError> {{
        self.client.raw_request(method, url, headers, body, options).await
    }}

"#
    ));

    for endpoint in &spec.endpoints {
        out.push_str(&generate_endpoint_method(spec, endpoint));
    }

    for (method, capability) in &spec.has {
        if matches!(capability, Capability::Tag(_)) && spec.endpoint(method).is_none() {
            if let Some(params) = emulated_params(method) {
                out.push_str(&generate_emulated_method(spec, method, params));
            }
        }
    }

    writeln!(out, "}}").unwrap();
    writeln!(out).unwrap();
    out
}

fn generate_endpoint_method(spec: &Spec, endpoint: &Endpoint) -> String {
    check_identifier(&spec.id, &endpoint.name);
    for param in &endpoint.params {
        check_identifier(&spec.id, param);
    }

    let mut out = String::new();
    writeln!(
        out,
        "    /// `{} {}`",
        endpoint.method.as_str(),
        endpoint.path
    )
    .unwrap();
    writeln!(out, "    pub async fn {}(", endpoint.name).unwrap();
    writeln!(out, "        &self,").unwrap();
    if endpoint.auth {
        writeln!(out, "        credentials: &uniex_signing::Credentials,").unwrap();
    }
    for param in &endpoint.params {
        writeln!(out, "        {param}: impl Into<serde_json::Value>,").unwrap();
    }
    writeln!(out, "        options: crate::config::CallOptions,").unwrap();
    writeln!(
        out,
        "    ) -> Result<serde_json::Value, crate::error::ExchangeError> {{"
    )
    .unwrap();
    writeln!(out, "        self.client").unwrap();
    writeln!(out, "            .call(").unwrap();
    writeln!(out, "                \"{}\",", endpoint.name).unwrap();
    writeln!(out, "                &[").unwrap();
    for param in &endpoint.params {
        writeln!(out, "                    (\"{param}\", {param}.into()),").unwrap();
    }
    writeln!(out, "                ],").unwrap();
    writeln!(out, "                options,").unwrap();
    if endpoint.auth {
        writeln!(out, "                Some(credentials),").unwrap();
    } else {
        writeln!(out, "                None,").unwrap();
    }
    writeln!(out, "            )").unwrap();
    writeln!(out, "            .await").unwrap();
    writeln!(out, "    }}").unwrap();
    writeln!(out).unwrap();
    out
}

fn generate_emulated_method(spec: &Spec, method: &str, params: &[&str]) -> String {
    check_identifier(&spec.id, method);

    let mut out = String::new();
    writeln!(out, "    /// Emulated: synthesised from other endpoints at runtime.").unwrap();
    writeln!(out, "    pub async fn {method}(").unwrap();
    writeln!(out, "        &self,").unwrap();
    for param in params {
        writeln!(out, "        {param}: impl Into<serde_json::Value>,").unwrap();
    }
    writeln!(out, "        options: crate::config::CallOptions,").unwrap();
    writeln!(
        out,
        "        credentials: Option<&uniex_signing::Credentials>,"
    )
    .unwrap();
    writeln!(
        out,
        "    ) -> Result<serde_json::Value, crate::error::ExchangeError> {{"
    )
    .unwrap();
    writeln!(out, "        self.client").unwrap();
    writeln!(out, "            .call(").unwrap();
    writeln!(out, "                \"{method}\",").unwrap();
    writeln!(out, "                &[").unwrap();
    for param in params {
        writeln!(out, "                    (\"{param}\", {param}.into()),").unwrap();
    }
    writeln!(out, "                ],").unwrap();
    writeln!(out, "                options,").unwrap();
    writeln!(out, "                credentials,").unwrap();
    writeln!(out, "            )").unwrap();
    writeln!(out, "            .await").unwrap();
    writeln!(out, "    }}").unwrap();
    writeln!(out).unwrap();
    out
}

fn generate_registry(structs: &[String]) -> String {
    let mut out = String::new();
    writeln!(out, "/// Every spec compiled into this build, in spec-file order.").unwrap();
    writeln!(
        out,
        "pub fn all_specs() -> Vec<&'static uniex_spec::Spec> {{"
    )
    .unwrap();
    writeln!(out, "    vec![").unwrap();
    for name in structs {
        writeln!(out, "        {name}::spec(),").unwrap();
    }
    writeln!(out, "    ]").unwrap();
    writeln!(out, "}}").unwrap();
    writeln!(out).unwrap();
    writeln!(
        out,
        "/// Look up a compiled spec by lowercase exchange id."
    )
    .unwrap();
    writeln!(
        out,
        "pub fn spec_for(id: &str) -> Option<&'static uniex_spec::Spec> {{"
    )
    .unwrap();
    writeln!(
        out,
        "    all_specs().into_iter().find(|spec| spec.id == id)"
    )
    .unwrap();
    writeln!(out, "}}").unwrap();
    out
}
