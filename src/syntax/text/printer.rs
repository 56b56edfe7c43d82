use crate::syntax::*;
use itertools::Itertools;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use std::fmt::{self, Display};

// Characters escaped in a remote path segment
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}')
    .add(b'/')
    .add(b'%');

/// Generic instance that delegates to subexpressions
impl<SE: Display + Clone> Display for ExprKind<SE> {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        use crate::syntax::ExprKind::*;
        match self {
            Lam(a, b, c) => {
                write!(f, "λ({} : {}) → {}", a, b, c)?;
            }
            BoolIf(a, b, c) => {
                write!(f, "if {} then {} else {}", a, b, c)?;
            }
            Pi(a, b, c) if a.as_ref() == "_" => {
                write!(f, "{} → {}", b, c)?;
            }
            Pi(a, b, c) => {
                write!(f, "∀({} : {}) → {}", a, b, c)?;
            }
            Let(bindings, body) => {
                for b in bindings {
                    write!(f, "let {}", b.variable)?;
                    if let Some(t) = &b.annot {
                        write!(f, " : {}", t)?;
                    }
                    write!(f, " = {} ", b.value)?;
                }
                write!(f, "in {}", body)?;
            }
            EmptyListLit(t) => {
                write!(f, "[] : {}", t)?;
            }
            NEListLit(es) => {
                fmt_list("[", ", ", "]", es, f, Display::fmt)?;
            }
            SomeLit(e) => {
                write!(f, "Some {}", e)?;
            }
            Merge(a, b, c) => {
                write!(f, "merge {} {}", a, b)?;
                if let Some(c) = c {
                    write!(f, " : {}", c)?;
                }
            }
            ToMap(a, b) => {
                write!(f, "toMap {}", a)?;
                if let Some(b) = b {
                    write!(f, " : {}", b)?;
                }
            }
            Annot(a, b) => {
                write!(f, "{} : {}", a, b)?;
            }
            Assert(a) => {
                write!(f, "assert : {}", a)?;
            }
            ExprKind::BinOp(op, a, b) => {
                write!(f, "{} {} {}", a, op, b)?;
            }
            ExprKind::App(a, b) => {
                write!(f, "{} {}", a, b)?;
            }
            Field(a, b) => {
                write!(f, "{}.{}", a, b)?;
            }
            Projection(e, ls) => {
                write!(f, "{}.", e)?;
                fmt_list("{ ", ", ", " }", ls, f, Display::fmt)?;
            }
            ProjectionByExpr(a, b) => {
                write!(f, "{}.({})", a, b)?;
            }
            Var(a) => a.fmt(f)?,
            Const(k) => k.fmt(f)?,
            Builtin(v) => v.fmt(f)?,
            BoolLit(true) => f.write_str("True")?,
            BoolLit(false) => f.write_str("False")?,
            NaturalLit(a) => a.fmt(f)?,
            IntegerLit(a) if *a >= 0 => {
                f.write_str("+")?;
                a.fmt(f)?;
            }
            IntegerLit(a) => a.fmt(f)?,
            DoubleLit(a) => a.fmt(f)?,
            TextLit(a) => a.fmt(f)?,
            RecordType(a) if a.is_empty() => f.write_str("{}")?,
            RecordType(a) => fmt_list("{ ", ", ", " }", a, f, |(k, t), f| {
                write!(f, "{} : {}", k, t)
            })?,
            RecordLit(a) if a.is_empty() => f.write_str("{=}")?,
            RecordLit(a) => fmt_list("{ ", ", ", " }", a, f, |(k, v), f| {
                write!(f, "{} = {}", k, v)
            })?,
            UnionType(a) => fmt_list("< ", " | ", " >", a, f, |(k, v), f| {
                write!(f, "{}", k)?;
                if let Some(v) = v {
                    write!(f, " : {}", v)?;
                }
                Ok(())
            })?,
            Embed(a) => a.fmt(f)?,
        }
        Ok(())
    }
}

// There is a one-to-one correspondence between the formatter and the grammar. Each phase is
// named after a corresponding grammar group, and the structure of the formatter reflects
// the relationship between the corresponding grammar rules. This leads to the nice property
// of automatically getting all the parentheses and precedences right.
#[derive(Debug, Copy, Clone, Ord, PartialOrd, Eq, PartialEq)]
enum PrintPhase {
    Base,
    Operator,
    BinOp(BinOp),
    App,
    Import,
    Primitive,
}

// Wraps an Expr with a phase, so that phase selection can be done
// separate from the actual printing
#[derive(Clone)]
struct PhasedExpr<'a>(&'a Expr, PrintPhase);

impl<'a> Display for PhasedExpr<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        self.0.fmt_phase(f, self.1)
    }
}

impl<'a> PhasedExpr<'a> {
    fn phase(self, phase: PrintPhase) -> PhasedExpr<'a> {
        PhasedExpr(self.0, phase)
    }
}

impl Expr {
    fn fmt_phase(
        &self,
        f: &mut fmt::Formatter,
        phase: PrintPhase,
    ) -> Result<(), fmt::Error> {
        use crate::syntax::ExprKind::*;
        use PrintPhase::*;

        let needs_paren = match self.kind() {
            Lam(..)
            | BoolIf(..)
            | Pi(..)
            | Let(..)
            | EmptyListLit(_)
            | SomeLit(_)
            | Merge(..)
            | ToMap(..)
            | Annot(..)
            | Assert(_)
                if phase > Base =>
            {
                true
            }
            // Precedence is magically handled by the ordering of BinOps.
            ExprKind::BinOp(op, _, _) if phase > PrintPhase::BinOp(*op) => {
                true
            }
            ExprKind::App(..) if phase > PrintPhase::App => true,
            Embed(_) if phase > PrintPhase::Import => true,
            _ => false,
        };

        // Annotate subexpressions with the appropriate phase, defaulting to Base
        let phased_self = match self.kind().map_ref(|e| PhasedExpr(e, Base)) {
            Pi(a, b, c) => {
                if a.as_ref() == "_" {
                    Pi(a, b.phase(Operator), c)
                } else {
                    Pi(a, b, c)
                }
            }
            Merge(a, b, c) => Merge(
                a.phase(PrintPhase::Import),
                b.phase(PrintPhase::Import),
                c.map(|x| x.phase(PrintPhase::App)),
            ),
            ToMap(a, b) => ToMap(
                a.phase(PrintPhase::Import),
                b.map(|x| x.phase(PrintPhase::App)),
            ),
            Annot(a, b) => Annot(a.phase(Operator), b),
            ExprKind::BinOp(op, a, b) => ExprKind::BinOp(
                op,
                a.phase(PrintPhase::BinOp(op)),
                b.phase(PrintPhase::BinOp(op)),
            ),
            SomeLit(e) => SomeLit(e.phase(PrintPhase::Import)),
            ExprKind::App(f, a) => ExprKind::App(
                f.phase(PrintPhase::App),
                a.phase(PrintPhase::Import),
            ),
            Field(a, b) => Field(a.phase(Primitive), b),
            Projection(e, ls) => Projection(e.phase(Primitive), ls),
            ProjectionByExpr(a, b) => ProjectionByExpr(a.phase(Primitive), b),
            e => e,
        };

        if needs_paren {
            f.write_str("(")?;
        }

        // Uses the ExprKind<PhasedExpr<_>> instance
        phased_self.fmt(f)?;

        if needs_paren {
            f.write_str(")")?;
        }
        Ok(())
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        self.fmt_phase(f, PrintPhase::Base)
    }
}

fn fmt_list<T, I, F>(
    open: &str,
    sep: &str,
    close: &str,
    it: I,
    f: &mut fmt::Formatter,
    func: F,
) -> Result<(), fmt::Error>
where
    I: IntoIterator<Item = T>,
    F: Fn(T, &mut fmt::Formatter) -> Result<(), fmt::Error>,
{
    f.write_str(open)?;
    for (i, x) in it.into_iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        func(x, f)?;
    }
    f.write_str(close)
}

/// Escape the contents of a text literal, without the surrounding quotes.
pub fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '$' => out.push_str("\\u0024"),
            '\u{0008}' => out.push_str("\\b"),
            '\u{000C}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            // 0x1f itself is printed as is
            '\u{0000}'..='\u{001E}' => {
                out.push_str(&format!("\\u{:04x}", c as u32))
            }
            c => out.push(c),
        }
    }
    out
}

impl<SubExpr: Display> Display for InterpolatedText<SubExpr> {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        f.write_str("\"")?;
        for x in self.iter() {
            match x {
                InterpolatedTextContents::Text(a) => {
                    f.write_str(&escape_text(&a))?;
                }
                InterpolatedTextContents::Expr(e) => {
                    f.write_str("${")?;
                    e.fmt(f)?;
                    f.write_str("}")?;
                }
            }
        }
        f.write_str("\"")?;
        Ok(())
    }
}

impl Display for Const {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        <Self as fmt::Debug>::fmt(self, f)
    }
}

impl Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        use crate::syntax::BinOp::*;
        f.write_str(match self {
            BoolOr => "||",
            TextAppend => "++",
            NaturalPlus => "+",
            BoolAnd => "&&",
            RecursiveRecordMerge => "∧",
            NaturalTimes => "*",
            BoolEQ => "==",
            BoolNE => "!=",
            RecursiveRecordTypeMerge => "⩓",
            ImportAlt => "?",
            RightBiasedRecordMerge => "⫽",
            ListAppend => "#",
            Equivalence => "≡",
        })
    }
}

impl Display for NaiveDouble {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        let v = f64::from(*self);
        if v == std::f64::INFINITY {
            f.write_str("Infinity")
        } else if v == std::f64::NEG_INFINITY {
            f.write_str("-Infinity")
        } else if v.is_nan() {
            f.write_str("NaN")
        } else {
            let s = format!("{}", v);
            if s.contains('e') || s.contains('.') {
                f.write_str(&s)
            } else {
                write!(f, "{}.0", s)
            }
        }
    }
}

impl Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        let s = self.as_ref();
        let is_reserved = match s {
            "let" | "in" | "if" | "then" | "else" | "Type" | "Kind"
            | "Sort" | "True" | "False" | "Some" | "merge" | "toMap"
            | "assert" | "forall" | "using" | "as" | "missing" => true,
            _ => Builtin::parse(s).is_some(),
        };
        let is_simple = s
            .chars()
            .next()
            .map_or(false, |c| c.is_ascii_alphabetic() || c == '_')
            && s.chars()
                .all(|c| c.is_ascii_alphanumeric() || "_-/".contains(c));
        if !is_reserved && is_simple {
            write!(f, "{}", s)
        } else {
            write!(f, "`{}`", s)
        }
    }
}

impl Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        match self {
            Hash::SHA256(hash) => write!(f, "sha256:{}", hex::encode(hash)),
        }
    }
}

impl Display for Import {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        use FilePrefix::*;
        use ImportLocation::*;
        use ImportMode::*;
        let fmt_remote_path_component = |s: &str| -> String {
            utf8_percent_encode(s, PATH_SEGMENT).to_string()
        };
        let fmt_local_path_component = |s: &str| -> String {
            if s.chars().all(|c| c.is_ascii_alphanumeric() || ".-_".contains(c))
            {
                s.to_owned()
            } else {
                format!("\"{}\"", s)
            }
        };

        match &self.location {
            Local(prefix, path) => {
                let prefix = match prefix {
                    Here => ".",
                    Parent => "..",
                    Home => "~",
                    Absolute => "",
                };
                write!(f, "{}/", prefix)?;
                let path: String = path
                    .file_path
                    .iter()
                    .map(|c| fmt_local_path_component(c))
                    .join("/");
                f.write_str(&path)?;
            }
            Remote(url) => {
                write!(f, "{}://{}/", url.scheme, url.authority)?;
                let path: String = url
                    .path
                    .file_path
                    .iter()
                    .map(|c| fmt_remote_path_component(c))
                    .join("/");
                f.write_str(&path)?;
                if let Some(q) = &url.query {
                    write!(f, "?{}", q)?
                }
            }
            Env(s) => {
                write!(f, "env:")?;
                if s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                    write!(f, "{}", s)?;
                } else {
                    write!(f, "\"")?;
                    for c in s.chars() {
                        match c {
                            '"' => f.write_str("\\\"")?,
                            '\\' => f.write_str("\\\\")?,
                            '\u{0007}' => f.write_str("\\a")?,
                            '\u{0008}' => f.write_str("\\b")?,
                            '\u{000C}' => f.write_str("\\f")?,
                            '\n' => f.write_str("\\n")?,
                            '\r' => f.write_str("\\r")?,
                            '\t' => f.write_str("\\t")?,
                            '\u{000B}' => f.write_str("\\v")?,
                            _ => write!(f, "{}", c)?,
                        }
                    }
                    write!(f, "\"")?;
                }
            }
            Missing => {
                write!(f, "missing")?;
            }
        }
        if let Some(hash) = &self.hash {
            write!(f, " ")?;
            hash.fmt(f)?;
        }
        match self.mode {
            Code => {}
            RawText => write!(f, " as Text")?,
            Location => write!(f, " as Location")?,
        }
        Ok(())
    }
}

impl Display for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        use crate::syntax::Builtin::*;
        f.write_str(match *self {
            Bool => "Bool",
            Natural => "Natural",
            Integer => "Integer",
            Double => "Double",
            Text => "Text",
            List => "List",
            Optional => "Optional",
            OptionalNone => "None",
            NaturalBuild => "Natural/build",
            NaturalFold => "Natural/fold",
            NaturalIsZero => "Natural/isZero",
            NaturalEven => "Natural/even",
            NaturalOdd => "Natural/odd",
            NaturalToInteger => "Natural/toInteger",
            NaturalShow => "Natural/show",
            NaturalSubtract => "Natural/subtract",
            IntegerToDouble => "Integer/toDouble",
            IntegerShow => "Integer/show",
            IntegerNegate => "Integer/negate",
            IntegerClamp => "Integer/clamp",
            DoubleShow => "Double/show",
            ListBuild => "List/build",
            ListFold => "List/fold",
            ListLength => "List/length",
            ListHead => "List/head",
            ListLast => "List/last",
            ListIndexed => "List/indexed",
            ListReverse => "List/reverse",
            OptionalFold => "Optional/fold",
            OptionalBuild => "Optional/build",
            TextShow => "Text/show",
        })
    }
}

impl Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        use crate::syntax::Scheme::*;
        f.write_str(match *self {
            HTTP => "http",
            HTTPS => "https",
        })
    }
}

impl Display for V {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        let V(x, n) = self;
        x.fmt(f)?;
        if *n != 0 {
            write!(f, "@{}", n)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::syntax::*;

    macro_rules! assert_eq_display {
        ($left:expr, $right:expr) => {{
            match (&$left, &$right) {
                (left_val, right_val) => {
                    if !(*left_val == *right_val) {
                        panic!(
                            r#"assertion failed: `(left == right)`
  left: `{}`,
 right: `{}`"#,
                            left_val, right_val
                        )
                    }
                }
            }
        }};
    }

    fn nat() -> Expr {
        builtin(Builtin::Natural)
    }

    #[test]
    fn text_escapes() {
        let t = text_lit("a\"b$c\\d\n\u{1}é");
        assert_eq_display!(t.to_string(), r#""a\"b\u0024c\\d\n\u0001é""#);
    }

    #[test]
    fn control_characters() {
        assert_eq_display!(text_lit("\u{1b}").to_string(), r#""\u001b""#);
        assert_eq_display!(text_lit("\u{1f}").to_string(), "\"\u{1f}\"");
    }

    #[test]
    fn interpolations() {
        let t = rc(ExprKind::TextLit(InterpolatedText::from_chunks(
            vec![("x = ".to_owned(), var("x"))],
            "!".to_owned(),
        )));
        assert_eq_display!(t.to_string(), r#""x = ${x}!""#);
    }

    #[test]
    fn doubles() {
        assert_eq_display!(double_lit(3.0).to_string(), "3.0");
        assert_eq_display!(double_lit(-1.5).to_string(), "-1.5");
        assert_eq_display!(
            double_lit(std::f64::INFINITY).to_string(),
            "Infinity"
        );
        assert_eq_display!(
            double_lit(std::f64::NEG_INFINITY).to_string(),
            "-Infinity"
        );
        assert_eq_display!(double_lit(std::f64::NAN).to_string(), "NaN");
    }

    #[test]
    fn integers_carry_a_sign() {
        assert_eq_display!(integer_lit(3).to_string(), "+3");
        assert_eq_display!(integer_lit(-3).to_string(), "-3");
        assert_eq_display!(natural_lit(3).to_string(), "3");
    }

    #[test]
    fn labels_and_variables() {
        assert_eq_display!(var_at("x", 2).to_string(), "x@2");
        assert_eq_display!(var("Natural").to_string(), "`Natural`");
        assert_eq_display!(var("if").to_string(), "`if`");
        assert_eq_display!(var("a b").to_string(), "`a b`");
        assert_eq_display!(var("_").to_string(), "_");
    }

    #[test]
    fn precedence() {
        let plus = binop(BinOp::NaturalPlus, var("x"), natural_lit(1));
        let times = binop(BinOp::NaturalTimes, plus.clone(), var("y"));
        assert_eq_display!(times.to_string(), "(x + 1) * y");

        let f = lam("x", nat(), plus);
        assert_eq_display!(
            app(f, vec![natural_lit(5)]).to_string(),
            "(λ(x : Natural) → x + 1) 5"
        );

        let g = app(var("f"), vec![app(var("g"), vec![var("x")])]);
        assert_eq_display!(g.to_string(), "f (g x)");

        let fld = field(app(var("f"), vec![var("x")]), "a");
        assert_eq_display!(fld.to_string(), "(f x).a");

        assert_eq_display!(
            fn_type(vec![fn_type(vec![nat()], nat())], nat()).to_string(),
            "(Natural → Natural) → Natural"
        );
    }

    #[test]
    fn records_and_unions() {
        let r = record_lit(vec![("b", natural_lit(2)), ("a", natural_lit(1))]);
        assert_eq_display!(r.to_string(), "{ a = 1, b = 2 }");
        assert_eq_display!(record_lit(vec![]).to_string(), "{=}");
        assert_eq_display!(record_type(vec![]).to_string(), "{}");
        let u = union_type(vec![("Left", Some(nat())), ("Right", None)]);
        assert_eq_display!(u.to_string(), "< Left : Natural | Right >");
    }

    #[test]
    fn lets() {
        let e = make_let(
            vec![
                binding("x", None, natural_lit(1)),
                binding("y", Some(nat()), var("x")),
            ],
            var("y"),
        );
        assert_eq_display!(
            e.to_string(),
            "let x = 1 let y : Natural = x in y"
        );
    }

    #[test]
    fn imports() {
        let i = Import::local("./a/b.dhall", ImportMode::RawText);
        assert_eq_display!(i.to_string(), "./a/b.dhall as Text");
        let i = Import::remote("https://example.com/a b/c", ImportMode::Code)
            .unwrap()
            .with_sha256(vec![0xde, 0xad]);
        assert_eq_display!(
            i.to_string(),
            "https://example.com/a%20b/c sha256:dead"
        );
        assert_eq_display!(
            Import::env("HOME", ImportMode::Location).to_string(),
            "env:HOME as Location"
        );
    }
}
