//! Language template engine
//!
//! Turns a bare solution (a `Solution` class or a free function) into a
//! runnable program. A harness embeds the user code verbatim and appends an
//! entry block that reads one stdin line per parameter, calls the entry point
//! and prints the result in canonical form:
//!
//! - int arrays as `[1,2,3]`, string arrays as `["a","b"]`
//! - scalars as plain text, booleans as `true` / `false`
//!
//! Array inputs are comma-separated on a single line; an empty line is an
//! empty array. Harnesses are [`HarnessAdapter`]s keyed by language, so a
//! caller can register its own in place of the built-ins.

use handlebars::Handlebars;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::Result;
use crate::sandbox::executor::Language;

/// Type of one entry-point parameter or of its return value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamType {
    Int,
    Long,
    Bool,
    String,
    IntArray,
    StringArray,
}

/// Shape of the function a solution must provide
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemSignature {
    /// Class holding the entry point
    #[serde(default = "default_class_name")]
    pub class_name: String,
    /// Entry point name
    pub method: String,
    /// Parameter types, one stdin line each
    #[serde(default)]
    pub params: Vec<ParamType>,
    /// Return type
    pub returns: ParamType,
}

fn default_class_name() -> String {
    "Solution".to_string()
}

impl ProblemSignature {
    /// Create a signature for `Solution.<method>`
    pub fn new(method: impl Into<String>, params: Vec<ParamType>, returns: ParamType) -> Self {
        ProblemSignature {
            class_name: default_class_name(),
            method: method.into(),
            params,
            returns,
        }
    }

    /// Use a different class name
    pub fn with_class_name(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = class_name.into();
        self
    }

    /// Whether the code defines the expected class
    fn defines_class(&self, code: &str) -> bool {
        code.contains(&format!("class {}", self.class_name))
    }
}

/// Produces a full program from user code for one language
pub trait HarnessAdapter: Send + Sync {
    /// Language this adapter handles
    fn language(&self) -> Language;

    /// Render the full program
    fn render(&self, code: &str, signature: &ProblemSignature) -> Result<String>;
}

/// Wraps source code for execution
pub struct TemplateEngine {
    adapters: HashMap<Language, Arc<dyn HarnessAdapter>>,
}

impl TemplateEngine {
    /// Engine with the built-in harnesses
    pub fn new() -> Self {
        let mut engine = Self::empty();
        engine.register(Arc::new(CppHarness::new()));
        engine.register(Arc::new(JavaHarness::new()));
        engine.register(Arc::new(PythonHarness::new()));
        engine.register(Arc::new(JavaScriptHarness::new()));
        engine
    }

    /// Engine without any harness; every language passes through
    pub fn empty() -> Self {
        TemplateEngine {
            adapters: HashMap::new(),
        }
    }

    /// Register an adapter, replacing any existing one for its language
    pub fn register(&mut self, adapter: Arc<dyn HarnessAdapter>) {
        self.adapters.insert(adapter.language(), adapter);
    }

    /// Whether a harness exists for the language
    pub fn has_harness(&self, language: Language) -> bool {
        self.adapters.contains_key(&language)
    }

    /// Produce the program to execute.
    ///
    /// Without a signature the code is treated as a complete program.
    pub fn wrap(
        &self,
        code: &str,
        language: Language,
        signature: Option<&ProblemSignature>,
    ) -> Result<String> {
        let Some(signature) = signature else {
            return Ok(code.to_string());
        };

        let Some(adapter) = self.adapters.get(&language) else {
            debug!("No harness for {}, running code as-is", language);
            return Ok(code.to_string());
        };

        if !code.contains(&signature.method) {
            warn!(
                "Entry point '{}' not found in {} source; wrapping anyway",
                signature.method, language
            );
        }

        adapter.render(code, signature)
    }
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn registry() -> Handlebars<'static> {
    let mut hb = Handlebars::new();
    hb.set_strict_mode(true);
    hb.register_escape_fn(handlebars::no_escape);
    hb
}

fn join_args(count: usize) -> String {
    (0..count)
        .map(|i| format!("_arg{}", i))
        .collect::<Vec<_>>()
        .join(", ")
}

// ---- C++ ----

const CPP_TEMPLATE: &str = r#"#include <bits/stdc++.h>
using namespace std;

{{{code}}}

static string _trim(const string& s) {
    size_t b = s.find_first_not_of(" \t\r\n");
    if (b == string::npos) return "";
    size_t e = s.find_last_not_of(" \t\r\n");
    return s.substr(b, e - b + 1);
}

static vector<string> _split(const string& s) {
    vector<string> out;
    string t = _trim(s);
    if (t.empty()) return out;
    stringstream ss(t);
    string item;
    while (getline(ss, item, ',')) out.push_back(_trim(item));
    return out;
}

static vector<int> _int_list(const string& s) {
    vector<int> out;
    for (const string& x : _split(s)) if (!x.empty()) out.push_back(stoi(x));
    return out;
}

static string _fmt(int v) { return to_string(v); }
static string _fmt(long long v) { return to_string(v); }
static string _fmt(bool v) { return v ? "true" : "false"; }
static string _fmt(const string& v) { return v; }

static string _fmt(const vector<int>& v) {
    string out = "[";
    for (size_t i = 0; i < v.size(); ++i) {
        if (i) out += ",";
        out += to_string(v[i]);
    }
    return out + "]";
}

static string _fmt(const vector<string>& v) {
    string out = "[";
    for (size_t i = 0; i < v.size(); ++i) {
        if (i) out += ",";
        out += "\"" + v[i] + "\"";
    }
    return out + "]";
}

int main() {
    vector<string> _lines;
    string _raw;
    while (getline(cin, _raw)) {
        if (!_raw.empty() && _raw.back() == '\r') _raw.pop_back();
        _lines.push_back(_raw);
    }
    auto _line = [&](size_t i) { return i < _lines.size() ? _lines[i] : string(); };
{{{args}}}
    {{{ret_type}}} _result = {{{call}}};
    cout << _fmt(_result) << endl;
    return 0;
}
"#;

/// C++ harness
pub struct CppHarness {
    registry: Handlebars<'static>,
}

impl CppHarness {
    pub fn new() -> Self {
        CppHarness { registry: registry() }
    }

    fn cpp_type(ty: ParamType) -> &'static str {
        match ty {
            ParamType::Int => "int",
            ParamType::Long => "long long",
            ParamType::Bool => "bool",
            ParamType::String => "string",
            ParamType::IntArray => "vector<int>",
            ParamType::StringArray => "vector<string>",
        }
    }

    fn parse(ty: ParamType, index: usize) -> String {
        match ty {
            ParamType::Int => format!("stoi(_trim(_line({})))", index),
            ParamType::Long => format!("stoll(_trim(_line({})))", index),
            ParamType::Bool => format!("_trim(_line({})) == \"true\"", index),
            ParamType::String => format!("_line({})", index),
            ParamType::IntArray => format!("_int_list(_line({}))", index),
            ParamType::StringArray => format!("_split(_line({}))", index),
        }
    }
}

impl Default for CppHarness {
    fn default() -> Self {
        Self::new()
    }
}

impl HarnessAdapter for CppHarness {
    fn language(&self) -> Language {
        Language::Cpp
    }

    fn render(&self, code: &str, signature: &ProblemSignature) -> Result<String> {
        let args = signature
            .params
            .iter()
            .enumerate()
            .map(|(i, ty)| format!("    {} _arg{} = {};", Self::cpp_type(*ty), i, Self::parse(*ty, i)))
            .collect::<Vec<_>>()
            .join("\n");

        let call = if signature.defines_class(code) {
            format!(
                "{}().{}({})",
                signature.class_name,
                signature.method,
                join_args(signature.params.len())
            )
        } else {
            format!("{}({})", signature.method, join_args(signature.params.len()))
        };

        let data = json!({
            "code": code,
            "args": args,
            "ret_type": Self::cpp_type(signature.returns),
            "call": call,
        });
        Ok(self.registry.render_template(CPP_TEMPLATE, &data)?)
    }
}

// ---- Java ----

const JAVA_TEMPLATE: &str = r#"import java.util.*;
import java.io.*;

{{{code}}}

public class Main {
    private static final List<String> LINES = new ArrayList<>();

    private static String line(int i) {
        return i < LINES.size() ? LINES.get(i) : "";
    }

    private static int[] intList(String s) {
        s = s.trim();
        if (s.isEmpty()) return new int[0];
        return Arrays.stream(s.split(","))
            .map(String::trim)
            .filter(x -> !x.isEmpty())
            .mapToInt(Integer::parseInt)
            .toArray();
    }

    private static String[] strList(String s) {
        s = s.trim();
        if (s.isEmpty()) return new String[0];
        String[] parts = s.split(",");
        for (int i = 0; i < parts.length; i++) parts[i] = parts[i].trim();
        return parts;
    }

    private static String fmt(int[] v) {
        StringBuilder sb = new StringBuilder("[");
        for (int i = 0; i < v.length; i++) {
            if (i > 0) sb.append(",");
            sb.append(v[i]);
        }
        return sb.append("]").toString();
    }

    private static String fmt(String[] v) {
        StringBuilder sb = new StringBuilder("[");
        for (int i = 0; i < v.length; i++) {
            if (i > 0) sb.append(",");
            sb.append("\"").append(v[i]).append("\"");
        }
        return sb.append("]").toString();
    }

    private static String fmt(Object v) {
        return String.valueOf(v);
    }

    public static void main(String[] args) throws IOException {
        BufferedReader reader = new BufferedReader(new InputStreamReader(System.in));
        String raw;
        while ((raw = reader.readLine()) != null) LINES.add(raw);
{{{args}}}
        {{{ret_type}}} result = {{{call}}};
        System.out.println(fmt(result));
    }
}
"#;

/// Java harness; the solution class must not be `public`
pub struct JavaHarness {
    registry: Handlebars<'static>,
}

impl JavaHarness {
    pub fn new() -> Self {
        JavaHarness { registry: registry() }
    }

    fn java_type(ty: ParamType) -> &'static str {
        match ty {
            ParamType::Int => "int",
            ParamType::Long => "long",
            ParamType::Bool => "boolean",
            ParamType::String => "String",
            ParamType::IntArray => "int[]",
            ParamType::StringArray => "String[]",
        }
    }

    fn parse(ty: ParamType, index: usize) -> String {
        match ty {
            ParamType::Int => format!("Integer.parseInt(line({}).trim())", index),
            ParamType::Long => format!("Long.parseLong(line({}).trim())", index),
            ParamType::Bool => format!("Boolean.parseBoolean(line({}).trim())", index),
            ParamType::String => format!("line({})", index),
            ParamType::IntArray => format!("intList(line({}))", index),
            ParamType::StringArray => format!("strList(line({}))", index),
        }
    }
}

impl Default for JavaHarness {
    fn default() -> Self {
        Self::new()
    }
}

impl HarnessAdapter for JavaHarness {
    fn language(&self) -> Language {
        Language::Java
    }

    fn render(&self, code: &str, signature: &ProblemSignature) -> Result<String> {
        let args = signature
            .params
            .iter()
            .enumerate()
            .map(|(i, ty)| {
                format!("        {} _arg{} = {};", Self::java_type(*ty), i, Self::parse(*ty, i))
            })
            .collect::<Vec<_>>()
            .join("\n");

        // Java has no free functions
        let call = format!(
            "new {}().{}({})",
            signature.class_name,
            signature.method,
            join_args(signature.params.len())
        );

        let data = json!({
            "code": code,
            "args": args,
            "ret_type": Self::java_type(signature.returns),
            "call": call,
        });
        Ok(self.registry.render_template(JAVA_TEMPLATE, &data)?)
    }
}

// ---- Python ----

const PYTHON_TEMPLATE: &str = r#"{{{code}}}


import json as _json
import sys as _sys


def _int_list(s):
    s = s.strip()
    return [int(x) for x in s.split(",") if x.strip()] if s else []


def _str_list(s):
    s = s.strip()
    return [x.strip() for x in s.split(",")] if s else []


def _fmt(value):
    if isinstance(value, bool):
        return "true" if value else "false"
    if isinstance(value, (list, tuple)):
        return "[" + ",".join(_json.dumps(v) if isinstance(v, str) else _fmt(v) for v in value) + "]"
    return str(value)


if __name__ == "__main__":
    _lines = _sys.stdin.read().split("\n")

    def _line(i):
        return _lines[i].rstrip("\r") if i < len(_lines) else ""

{{{args}}}
    print(_fmt({{{call}}}))
"#;

/// Python harness
pub struct PythonHarness {
    registry: Handlebars<'static>,
}

impl PythonHarness {
    pub fn new() -> Self {
        PythonHarness { registry: registry() }
    }

    fn parse(ty: ParamType, index: usize) -> String {
        match ty {
            ParamType::Int | ParamType::Long => format!("int(_line({}).strip())", index),
            ParamType::Bool => format!("_line({}).strip().lower() == \"true\"", index),
            ParamType::String => format!("_line({})", index),
            ParamType::IntArray => format!("_int_list(_line({}))", index),
            ParamType::StringArray => format!("_str_list(_line({}))", index),
        }
    }
}

impl Default for PythonHarness {
    fn default() -> Self {
        Self::new()
    }
}

impl HarnessAdapter for PythonHarness {
    fn language(&self) -> Language {
        Language::Python
    }

    fn render(&self, code: &str, signature: &ProblemSignature) -> Result<String> {
        let args = signature
            .params
            .iter()
            .enumerate()
            .map(|(i, ty)| format!("    _arg{} = {}", i, Self::parse(*ty, i)))
            .collect::<Vec<_>>()
            .join("\n");

        let call = if signature.defines_class(code) {
            format!(
                "{}().{}({})",
                signature.class_name,
                signature.method,
                join_args(signature.params.len())
            )
        } else {
            format!("{}({})", signature.method, join_args(signature.params.len()))
        };

        let data = json!({ "code": code, "args": args, "call": call });
        Ok(self.registry.render_template(PYTHON_TEMPLATE, &data)?)
    }
}

// ---- JavaScript ----

const JAVASCRIPT_TEMPLATE: &str = r#"{{{code}}}

const _lines = require("fs").readFileSync(0, "utf8").split("\n");

function _line(i) {
    return i < _lines.length ? _lines[i].replace(/\r$/, "") : "";
}

function _intList(s) {
    s = s.trim();
    return s ? s.split(",").filter((x) => x.trim() !== "").map((x) => parseInt(x, 10)) : [];
}

function _strList(s) {
    s = s.trim();
    return s ? s.split(",").map((x) => x.trim()) : [];
}

function _fmt(v) {
    if (Array.isArray(v)) {
        return "[" + v.map((x) => (typeof x === "string" ? JSON.stringify(x) : _fmt(x))).join(",") + "]";
    }
    return String(v);
}

{{{args}}}
console.log(_fmt({{{call}}}));
"#;

/// JavaScript (Node.js) harness
pub struct JavaScriptHarness {
    registry: Handlebars<'static>,
}

impl JavaScriptHarness {
    pub fn new() -> Self {
        JavaScriptHarness { registry: registry() }
    }

    fn parse(ty: ParamType, index: usize) -> String {
        match ty {
            ParamType::Int | ParamType::Long => format!("parseInt(_line({}).trim(), 10)", index),
            ParamType::Bool => format!("_line({}).trim().toLowerCase() === \"true\"", index),
            ParamType::String => format!("_line({})", index),
            ParamType::IntArray => format!("_intList(_line({}))", index),
            ParamType::StringArray => format!("_strList(_line({}))", index),
        }
    }
}

impl Default for JavaScriptHarness {
    fn default() -> Self {
        Self::new()
    }
}

impl HarnessAdapter for JavaScriptHarness {
    fn language(&self) -> Language {
        Language::JavaScript
    }

    fn render(&self, code: &str, signature: &ProblemSignature) -> Result<String> {
        let args = signature
            .params
            .iter()
            .enumerate()
            .map(|(i, ty)| format!("const _arg{} = {};", i, Self::parse(*ty, i)))
            .collect::<Vec<_>>()
            .join("\n");

        let call = if signature.defines_class(code) {
            format!(
                "new {}().{}({})",
                signature.class_name,
                signature.method,
                join_args(signature.params.len())
            )
        } else {
            format!("{}({})", signature.method, join_args(signature.params.len()))
        };

        let data = json!({ "code": code, "args": args, "call": call });
        Ok(self.registry.render_template(JAVASCRIPT_TEMPLATE, &data)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_sum() -> ProblemSignature {
        ProblemSignature::new(
            "twoSum",
            vec![ParamType::IntArray, ParamType::Int],
            ParamType::IntArray,
        )
    }

    const CPP_TWO_SUM: &str = r#"class Solution {
public:
    vector<int> twoSum(vector<int>& nums, int target) {
        unordered_map<int, int> seen;
        for (int i = 0; i < (int)nums.size(); ++i) {
            auto it = seen.find(target - nums[i]);
            if (it != seen.end()) return {it->second, i};
            seen[nums[i]] = i;
        }
        return {};
    }
};"#;

    #[test]
    fn test_wrap_keeps_code_for_every_language() {
        let engine = TemplateEngine::new();
        let code = "def twoSum(nums, target):\n    return [0, 1]\n";
        let signature = two_sum();

        for language in Language::ALL {
            let wrapped = engine.wrap(code, language, Some(&signature)).unwrap();
            assert!(wrapped.contains(code), "code mutated for {}", language);

            let bare = engine.wrap(code, language, None).unwrap();
            assert_eq!(bare, code);
        }
    }

    #[test]
    fn test_cpp_harness() {
        let engine = TemplateEngine::new();
        let program = engine
            .wrap(CPP_TWO_SUM, Language::Cpp, Some(&two_sum()))
            .unwrap();

        assert!(program.starts_with("#include <bits/stdc++.h>"));
        assert!(program.contains("vector<int> _arg0 = _int_list(_line(0));"));
        assert!(program.contains("int _arg1 = stoi(_trim(_line(1)));"));
        assert!(program.contains("vector<int> _result = Solution().twoSum(_arg0, _arg1);"));
        assert!(program.contains("int main()"));
    }

    #[test]
    fn test_python_free_function_and_class() {
        let engine = TemplateEngine::new();
        let signature = two_sum();

        let free = engine
            .wrap("def twoSum(nums, target):\n    pass\n", Language::Python, Some(&signature))
            .unwrap();
        assert!(free.contains("print(_fmt(twoSum(_arg0, _arg1)))"));

        let class = engine
            .wrap(
                "class Solution:\n    def twoSum(self, nums, target):\n        pass\n",
                Language::Python,
                Some(&signature),
            )
            .unwrap();
        assert!(class.contains("print(_fmt(Solution().twoSum(_arg0, _arg1)))"));
        assert!(class.contains("    _arg0 = _int_list(_line(0))"));
    }

    #[test]
    fn test_java_harness_uses_declared_types() {
        let engine = TemplateEngine::new();
        let signature = ProblemSignature::new(
            "isPalindrome",
            vec![ParamType::String],
            ParamType::Bool,
        );
        let program = engine
            .wrap("class Solution { boolean isPalindrome(String s) { return true; } }", Language::Java, Some(&signature))
            .unwrap();

        assert!(program.contains("public class Main"));
        assert!(program.contains("String _arg0 = line(0);"));
        assert!(program.contains("boolean result = new Solution().isPalindrome(_arg0);"));
    }

    #[test]
    fn test_javascript_harness() {
        let engine = TemplateEngine::new();
        let program = engine
            .wrap(
                "var twoSum = function(nums, target) { return [0, 1]; };",
                Language::JavaScript,
                Some(&two_sum()),
            )
            .unwrap();
        assert!(program.contains("const _arg1 = parseInt(_line(1).trim(), 10);"));
        assert!(program.contains("console.log(_fmt(twoSum(_arg0, _arg1)));"));
    }

    #[test]
    fn test_custom_adapter_replaces_builtin() {
        struct Banner;

        impl HarnessAdapter for Banner {
            fn language(&self) -> Language {
                Language::Python
            }

            fn render(&self, code: &str, _signature: &ProblemSignature) -> Result<String> {
                Ok(format!("# custom\n{}", code))
            }
        }

        let mut engine = TemplateEngine::new();
        engine.register(Arc::new(Banner));
        let program = engine.wrap("x = 1", Language::Python, Some(&two_sum())).unwrap();
        assert_eq!(program, "# custom\nx = 1");
    }

    #[test]
    fn test_missing_entry_point_still_wraps() {
        let engine = TemplateEngine::new();
        let program = engine
            .wrap("print('no solution here')", Language::Python, Some(&two_sum()))
            .unwrap();
        assert!(program.contains("print('no solution here')"));
        assert!(program.contains("twoSum(_arg0, _arg1)"));
    }

    #[test]
    fn test_signature_from_json() {
        let signature: ProblemSignature = serde_json::from_str(
            r#"{"method": "maxProfit", "params": ["int_array"], "returns": "int"}"#,
        )
        .unwrap();
        assert_eq!(signature.class_name, "Solution");
        assert_eq!(signature.params, vec![ParamType::IntArray]);
    }
}
