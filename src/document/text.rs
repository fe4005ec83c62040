//! Line-level text substitution: inline macros, block headers and the
//! ignore list

use std::fmt;
use std::sync::Arc;

use regex_lite::{Captures, NoExpand, Regex};

use crate::errors::RegistryError;

/// What a text rule puts in place of each match
#[derive(Clone)]
pub enum Replacement {
    /// Inserted as is; `$` has no special meaning
    Literal(String),
    /// May refer to capture groups as `${1}`
    Template(String),
    Function(Arc<dyn Fn(&Captures<'_>) -> String + Send + Sync>),
}

impl Replacement {
    pub fn function(f: impl Fn(&Captures<'_>) -> String + Send + Sync + 'static) -> Self {
        Replacement::Function(Arc::new(f))
    }
}

impl fmt::Debug for Replacement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Replacement::Literal(s) => f.debug_tuple("Literal").field(s).finish(),
            Replacement::Template(s) => f.debug_tuple("Template").field(s).finish(),
            Replacement::Function(_) => f.write_str("Function(..)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TextRule {
    pub name: String,
    pattern: Regex,
    replacement: Replacement,
}

impl TextRule {
    fn apply(&self, contents: &str) -> String {
        match &self.replacement {
            Replacement::Literal(s) => self
                .pattern
                .replace_all(contents, NoExpand(s.as_str()))
                .into_owned(),
            Replacement::Template(s) => self.pattern.replace_all(contents, s.as_str()).into_owned(),
            Replacement::Function(f) => self
                .pattern
                .replace_all(contents, |caps: &Captures<'_>| f(caps))
                .into_owned(),
        }
    }
}

/// `\begin{name}` / `\end{name}` replaced by fixed text
#[derive(Debug, Clone)]
pub struct HeaderRule {
    pub name: String,
    begin: Regex,
    end: Regex,
    begin_text: String,
    end_text: String,
}

/// Substitution and ignore rules, applied in registration order
#[derive(Debug, Clone, Default)]
pub struct TextRules {
    text: Vec<TextRule>,
    headers: Vec<HeaderRule>,
    ignore: Vec<Regex>,
}

fn compile(name: &str, pattern: &str) -> Result<Regex, RegistryError> {
    Regex::new(pattern).map_err(|e| RegistryError::InvalidPattern {
        name: name.to_string(),
        message: e.to_string(),
    })
}

impl TextRules {
    pub fn with_defaults() -> Self {
        let mut rules = Self::default();

        macro_rules! text_rules {
            ($($name:literal => $pattern:literal, $replacement:expr;)*) => {
                $(
                    if let Err(err) = rules.add_text($name, $pattern, $replacement) {
                        crate::log::warn!("default text rule: {}", err);
                    }
                )*
            };
        }

        let literal = |s: &str| Replacement::Literal(s.to_string());
        let template = |s: &str| Replacement::Template(s.to_string());

        // Order matters: em dashes before en dashes
        text_rules! {
            "emph"    => r"\\emph\{([^}]*)\}", template("<i>${1}</i>");
            "bf"      => r"\{*\\bf ([^}]*)\}", template("<b>${1}</b>");
            "rm"      => r"\{*\\rm ([^}]*)\}", template(r#"<span class="rm">${1}</span>"#);
            "sl"      => r"\{*\\sl ([^}]*)\}", template("<i>${1}</i>");
            "it"      => r"\{*\\it ([^}]*)\}", template("<i>${1}</i>");
            "tt"      => r"\{*\\tt ([^}]*)\}", template(r#"<span class="tt">${1}</span>"#);
            "mdash"   => r"---", literal("&mdash;");
            "ndash"   => r"--", literal("&ndash;");
            "openq"   => r"``", literal("&ldquo;");
            "closeq"  => r"''", literal("&rdquo;");
            "TeX"     => r"\\TeX\\?", literal(r"$\TeX$");
            "LaTeX"   => r"\\LaTeX\\?", literal(r"$\LaTeX$");
            "vspace"  => r"\\vspace(\{[^}]*\})?", literal("<br>");
            "cite"    => r"\\cite\[(\d+)\]\{([^}]*)\}", template(r##"<a class="cite" href="#${2}">[p${1}]</a>"##);
            "href"    => r"\\href\{([^}]*)\}\{([^}]*)\}", template(r#"<a href="${1}">${2}</a>"#);
            "img"     => r"\\img\{([^}]*)\}", template(r#"<div style="width: 100%;text-align: center;"><img src="${1}"></div>"#);
            "set"     => r"\\set\{([^}]*)\}", template("<i>${1}</i>");
            "youtube" => r"\\youtube\{([^}]*)\}", template(r#"<div style="width: 100%;text-align: center;"><iframe width="560" height="315" src="https://www.youtube.com/embed/${1}" frameborder="0" allowfullscreen></iframe></div>"#);
            "euler"   => r"Euler\^", literal("exp");
        }

        for (name, title) in [
            ("claim", "Claim"),
            ("corollary", "Corollary"),
            ("definition", "Definition"),
            ("example", "Example"),
            ("problem", "Problem"),
            ("solution", "Solution"),
            ("theorem", "Theorem"),
        ] {
            let begin = format!("<h4>{title}</h4>");
            if let Err(err) = rules.add_headers(name, &begin, "") {
                crate::log::warn!("default header rule: {}", err);
            }
        }
        let extra = [
            ("quotation", r#"<p class="quotation">"#, "</p>"),
            ("proof", "<h4>Proof</h4>", r"$\qed$"),
        ];
        for (name, begin, end) in extra {
            if let Err(err) = rules.add_headers(name, begin, end) {
                crate::log::warn!("default header rule: {}", err);
            }
        }

        for pattern in [
            r"^\s*%",
            r"\\begin\{document\}",
            r"\\end\{document\}",
            r"\\begin\{interactive\}",
            r"\\end\{interactive\}",
            r"\\usepackage",
            r"\\documentclass",
            r"\\tableofcontents",
            r"\\author",
            r"\\date",
            r"\\maketitle",
            r"\\title",
            r"\\pagestyle",
            r"\\smallskip",
            r"\\medskip",
            r"\\bigskip",
            r"\\nobreak",
            r"\\begin\{center\}",
            r"\\end\{center\}",
        ] {
            if let Err(err) = rules.add_ignore(pattern) {
                crate::log::warn!("default ignore rule: {}", err);
            }
        }

        rules
    }

    /// Register a text rule. A rule with the same name is replaced in place.
    pub fn add_text(
        &mut self,
        name: &str,
        pattern: &str,
        replacement: Replacement,
    ) -> Result<(), RegistryError> {
        let rule = TextRule {
            name: name.to_string(),
            pattern: compile(name, pattern)?,
            replacement,
        };
        match self.text.iter_mut().find(|r| r.name == name) {
            Some(existing) => *existing = rule,
            None => self.text.push(rule),
        }
        Ok(())
    }

    /// Register a header rule for `\begin{name}` and `\end{name}`.
    pub fn add_headers(&mut self, name: &str, begin: &str, end: &str) -> Result<(), RegistryError> {
        if name.is_empty() || name.contains(['{', '}']) {
            return Err(RegistryError::InvalidName {
                name: name.to_string(),
            });
        }
        let escaped = regex_lite::escape(name);
        let rule = HeaderRule {
            name: name.to_string(),
            begin: compile(name, &format!(r"\\begin\{{{escaped}\}}"))?,
            end: compile(name, &format!(r"\\end\{{{escaped}\}}"))?,
            begin_text: begin.to_string(),
            end_text: end.to_string(),
        };
        match self.headers.iter_mut().find(|r| r.name == name) {
            Some(existing) => *existing = rule,
            None => self.headers.push(rule),
        }
        Ok(())
    }

    pub fn add_ignore(&mut self, pattern: &str) -> Result<(), RegistryError> {
        self.ignore.push(compile("ignore", pattern)?);
        Ok(())
    }

    /// Whether a fragment is dropped from content altogether
    pub fn is_ignored(&self, fragment: &str) -> bool {
        self.ignore.iter().any(|re| re.is_match(fragment))
    }

    /// Substitute one fragment. A matching header replaces the whole fragment.
    pub fn apply(&self, fragment: &str) -> String {
        let mut contents = fragment.to_string();
        for rule in &self.text {
            contents = rule.apply(&contents);
        }
        for rule in &self.headers {
            if rule.begin.is_match(fragment) {
                contents = rule.begin_text.clone();
            }
            if rule.end.is_match(fragment) {
                contents = rule.end_text.clone();
            }
        }
        contents
    }
}
