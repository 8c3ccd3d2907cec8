use serde::{Deserialize, Serialize};

/// Toolchain environments an exercise can be compiled and run in.
/// Serialized/deserialized in `lowercase`; common aliases are accepted
/// (e.g., "cc", "c++", "golang", "c#", "js").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    C,
    #[serde(alias = "cc", alias = "c++")]
    Cpp,
    Rust,
    #[serde(alias = "golang")]
    Go,
    Java,
    #[serde(alias = "c#")]
    CSharp,
    Haskell,
    #[serde(alias = "python3")]
    Python,
    #[serde(alias = "js", alias = "node")]
    JavaScript,
}

impl Language {
    pub const ALL: [Language; 9] = [
        Language::C,
        Language::Cpp,
        Language::Rust,
        Language::Go,
        Language::Java,
        Language::CSharp,
        Language::Haskell,
        Language::Python,
        Language::JavaScript,
    ];

    /// Stable short name, used as the prefix of the language's box tags.
    pub fn tag(self) -> &'static str {
        match self {
            Language::C => "c",
            Language::Cpp => "cpp",
            Language::Rust => "rust",
            Language::Go => "go",
            Language::Java => "java",
            Language::CSharp => "csharp",
            Language::Haskell => "haskell",
            Language::Python => "python",
            Language::JavaScript => "javascript",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Language> {
        Language::ALL.into_iter().find(|l| l.tag() == tag)
    }
}

pub trait LanguageExt {
    /// Name of the artifact the compilation step produces by default.
    fn artifact_name(&self) -> &'static str;

    /// Binary the worker invokes for the compilation step.
    fn compiler_binary(&self) -> &'static str;

    /// Arguments of the compilation step.
    fn compile_args(&self, sources: &[String], artifact: &str, extra: &[String]) -> Vec<String>;

    /// Whether the compilation step leaves the first source as the artifact
    /// (interpreted languages only syntax-check).
    fn is_interpreted(&self) -> bool;

    /// `(binary, args)` that runs `artifact` with program arguments `args`.
    fn run_command(&self, artifact: &str, args: &[String]) -> (String, Vec<String>);
}

impl LanguageExt for Language {
    fn artifact_name(&self) -> &'static str {
        match self {
            Language::Java => "classes",
            Language::CSharp => "program.exe",
            Language::Python => "main.py",
            Language::JavaScript => "main.js",
            _ => "a.out",
        }
    }

    fn compiler_binary(&self) -> &'static str {
        match self {
            Language::C => "gcc",
            Language::Cpp => "g++",
            Language::Rust => "rustc",
            Language::Go => "go",
            Language::Java => "javac",
            Language::CSharp => "mcs",
            Language::Haskell => "ghc",
            Language::Python => "python3",
            Language::JavaScript => "node",
        }
    }

    fn compile_args(&self, sources: &[String], artifact: &str, extra: &[String]) -> Vec<String> {
        let mut args: Vec<String> = Vec::new();
        match self {
            Language::C => {
                args.extend(["-O2", "-std=c11", "-Wall"].map(String::from));
                args.extend(extra.iter().cloned());
                args.extend(sources.iter().cloned());
                args.extend(["-o".to_string(), artifact.to_string(), "-lm".to_string()]);
            }
            Language::Cpp => {
                args.extend(["-O2", "-std=c++17", "-Wall"].map(String::from));
                args.extend(extra.iter().cloned());
                args.extend(sources.iter().cloned());
                args.extend(["-o".to_string(), artifact.to_string()]);
            }
            Language::Rust => {
                // rustc takes a single crate root; other sources are modules of it.
                args.extend(["-O", "--edition", "2021", "-o"].map(String::from));
                args.push(artifact.to_string());
                args.extend(extra.iter().cloned());
                args.extend(sources.first().cloned());
            }
            Language::Go => {
                args.extend(["build", "-o"].map(String::from));
                args.push(artifact.to_string());
                args.extend(extra.iter().cloned());
                args.extend(sources.iter().cloned());
            }
            Language::Java => {
                args.push("-d".to_string());
                args.push(artifact.to_string());
                args.extend(extra.iter().cloned());
                args.extend(sources.iter().cloned());
            }
            Language::CSharp => {
                args.push(format!("-out:{artifact}"));
                args.extend(extra.iter().cloned());
                args.extend(sources.iter().cloned());
            }
            Language::Haskell => {
                args.extend(["-O2", "-o"].map(String::from));
                args.push(artifact.to_string());
                args.extend(extra.iter().cloned());
                args.extend(sources.iter().cloned());
            }
            Language::Python => {
                args.extend(["-m", "py_compile"].map(String::from));
                args.extend(sources.iter().cloned());
            }
            Language::JavaScript => {
                args.push("--check".to_string());
                args.extend(sources.first().cloned());
            }
        }
        args
    }

    fn is_interpreted(&self) -> bool {
        matches!(self, Language::Python | Language::JavaScript)
    }

    fn run_command(&self, artifact: &str, args: &[String]) -> (String, Vec<String>) {
        let (binary, mut full): (String, Vec<String>) = match self {
            Language::Java => (
                "java".to_string(),
                vec!["-cp".to_string(), artifact.to_string(), "Main".to_string()],
            ),
            Language::CSharp => ("mono".to_string(), vec![artifact.to_string()]),
            Language::Python => ("python3".to_string(), vec![artifact.to_string()]),
            Language::JavaScript => ("node".to_string(), vec![artifact.to_string()]),
            _ => (artifact.to_string(), Vec::new()),
        };
        full.extend(args.iter().cloned());
        (binary, full)
    }
}
