//! Best-effort source rewriting for the sandbox runtime.
//!
//! The preview target only has to execute, not type-check, so typed component
//! source goes through a sequence of targeted regex rewrites instead of a
//! full parser. The transform is approximate on purpose; anything it misses
//! surfaces inside the sandbox's guarded mount, never in the host.

use regex::Regex;
use std::sync::LazyLock;

/// Seam for the source transform, so a parser-based implementation can
/// replace the regex one without touching the renderer.
pub trait Preprocessor: Send + Sync {
    fn process(&self, source: &str) -> String;
}

static HOOK_GENERICS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(useState|useRef|useReducer|useContext|useMemo|useCallback|useEffect)<[^>()]*>")
        .expect("hook generics regex")
});

static DECL_ANNOTATION: LazyLock<Regex> = LazyLock::new(|| {
    // `const app: React.FC<Props> =` -> `const app =`
    Regex::new(r"\b(const|let|var)\s+([A-Za-z_$][\w$]*)\s*:\s*[A-Za-z_$][\w$.]*(<[^=]*?>)?(\[\])?\s*=")
        .expect("declaration annotation regex")
});

static PARAM_ANNOTATION: LazyLock<Regex> = LazyLock::new(|| {
    // `(count: number,` / `, label: string)` -> bare identifiers.
    Regex::new(r"([(,]\s*)([A-Za-z_$][\w$]*)\s*:\s*[A-Za-z_$][\w$.]*(<[^>)]*>)?(\[\])?")
        .expect("parameter annotation regex")
});

static DESTRUCTURE_ANNOTATION: LazyLock<Regex> = LazyLock::new(|| {
    // `}: Props)` -> `})`
    Regex::new(r"\}\s*:\s*[A-Za-z_$][\w$.]*(<[^>)]*>)?").expect("destructuring annotation regex")
});

static AS_ASSERTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s+as\s+[A-Za-z_$][\w$.]*(<[^>]*>)?(\[\])?").expect("as assertion regex")
});

static TYPE_ALIAS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*(export\s+)?type\s+[A-Za-z_$][\w$]*(<[^>]*>)?\s*=[^;]*;\s*$")
        .expect("type alias regex")
});

/// Regex-based type-annotation stripper.
#[derive(Debug, Default)]
pub struct TypeStripper;

impl Preprocessor for TypeStripper {
    fn process(&self, source: &str) -> String {
        let mut out = drop_interface_blocks(source);
        out = TYPE_ALIAS.replace_all(&out, "").into_owned();
        out = HOOK_GENERICS.replace_all(&out, "$1").into_owned();
        out = DECL_ANNOTATION.replace_all(&out, "$1 $2 =").into_owned();
        out = DESTRUCTURE_ANNOTATION.replace_all(&out, "}").into_owned();
        out = PARAM_ANNOTATION.replace_all(&out, "$1$2").into_owned();
        out = AS_ASSERTION.replace_all(&out, "").into_owned();
        out
    }
}

/// Remove `interface X { ... }` blocks, counting braces so nested members go
/// with them.
fn drop_interface_blocks(source: &str) -> String {
    static INTERFACE_START: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?m)^\s*(export\s+)?interface\s+[A-Za-z_$][\w$]*[^\{]*\{")
            .expect("interface start regex")
    });

    let mut out = String::with_capacity(source.len());
    let mut rest = source;
    while let Some(m) = INTERFACE_START.find(rest) {
        out.push_str(&rest[..m.start()]);
        let after = &rest[m.end()..];
        let mut depth = 1usize;
        let mut consumed = after.len();
        for (i, ch) in after.char_indices() {
            match ch {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        consumed = i + 1;
                        break;
                    }
                }
                _ => {}
            }
        }
        rest = &after[consumed.min(after.len())..];
    }
    out.push_str(rest);
    out
}

/// Escape generated source for embedding inside a template-literal string in
/// the harness script. Covers backslashes, backticks, `${` interpolation, and
/// every `</`: tag parsing is case-insensitive, so `</SCRIPT>` would close
/// the surrounding script element just as `</script>` does. `<\/` evaluates
/// back to `</` inside the literal.
pub fn escape_for_embed(source: &str) -> String {
    source
        .replace('\\', "\\\\")
        .replace('`', "\\`")
        .replace("${", "\\${")
        .replace("</", "<\\/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn strip(source: &str) -> String {
        TypeStripper.process(source)
    }

    #[test]
    fn strips_hook_generics() {
        assert_eq!(
            strip("const [n, setN] = useState<number>(0);"),
            "const [n, setN] = useState(0);"
        );
    }

    #[test]
    fn strips_declaration_annotations() {
        assert_eq!(
            strip("const App: React.FC<Props> = () => null;"),
            "const App = () => null;"
        );
    }

    #[test]
    fn strips_parameter_annotations() {
        assert_eq!(
            strip("function add(a: number, b: number) { return a + b; }"),
            "function add(a, b) { return a + b; }"
        );
    }

    #[test]
    fn strips_destructured_props_annotation() {
        assert_eq!(
            strip("function Card({ title, body }: CardProps) {}"),
            "function Card({ title, body }) {}"
        );
    }

    #[test]
    fn strips_as_assertions() {
        assert_eq!(
            strip("const el = document.getElementById('x') as HTMLDivElement;"),
            "const el = document.getElementById('x');"
        );
    }

    #[test]
    fn drops_interface_blocks() {
        let src = "interface Props {\n  label: string;\n  nested: { a: number };\n}\nconst x = 1;";
        assert_eq!(strip(src).trim(), "const x = 1;");
    }

    #[test]
    fn drops_type_aliases() {
        let src = "export type Theme = 'light' | 'dark';\nlet t = 'light';";
        assert_eq!(strip(src).trim(), "let t = 'light';");
    }

    #[test]
    fn untyped_source_passes_through() {
        let src = "function App() { return <h1>Hi</h1>; }";
        assert_eq!(strip(src), src);
    }

    #[test]
    fn escape_covers_script_closers() {
        let escaped = escape_for_embed("const s = `a${b}`; // </script>");
        assert!(escaped.contains("\\`a\\${b}\\`"));
        assert!(escaped.contains("<\\/script>"));
        assert!(!escaped.contains("</script"));
    }

    #[test]
    fn escape_covers_script_closers_of_any_case() {
        let escaped = escape_for_embed("// </SCRIPT></Script></p>");
        assert!(escaped.contains("<\\/SCRIPT>"));
        assert!(escaped.contains("<\\/Script>"));
        assert!(!escaped.contains("</"));
    }
}
