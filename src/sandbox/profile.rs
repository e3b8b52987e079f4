//! Language profiles
//!
//! One static profile per [`Language`]: the judge's language id, the file
//! name the source is written to, and the local compile/run commands.

use serde::Serialize;
use std::path::Path;

use crate::sandbox::executor::Language;

/// A command line with `{src}`, `{exe}` and `{dir}` placeholders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CommandTemplate {
    argv: &'static [&'static str],
}

impl CommandTemplate {
    /// Build a template; the first element is the program
    pub const fn new(argv: &'static [&'static str]) -> Self {
        CommandTemplate { argv }
    }

    /// The program this command starts, before substitution
    pub fn program(&self) -> &'static str {
        self.argv[0]
    }

    /// Substitute workspace paths and split into program and arguments
    pub fn render(&self, dir: &Path, src: &Path, exe: Option<&Path>) -> (String, Vec<String>) {
        let dir = dir.to_string_lossy();
        let src = src.to_string_lossy();
        let exe = exe.map(|p| p.to_string_lossy()).unwrap_or_default();

        let mut parts = self.argv.iter().map(|part| {
            part.replace("{dir}", &dir)
                .replace("{src}", &src)
                .replace("{exe}", &exe)
        });
        let program = parts.next().unwrap_or_default();
        (program, parts.collect())
    }
}

/// Static execution profile for one language
#[derive(Debug, Clone, Copy, Serialize)]
pub struct LanguageProfile {
    /// The language this profile describes
    pub language: Language,
    /// Language identifier understood by the judge service
    pub remote_id: u32,
    /// File name the source is written to
    pub source_file: &'static str,
    /// File name of the compiled artifact, if there is a single one
    pub executable_file: Option<&'static str>,
    /// Compile step for compiled languages
    pub compile: Option<CommandTemplate>,
    /// Run step
    pub run: CommandTemplate,
}

impl LanguageProfile {
    /// Look up the profile for a language. Every language has exactly one.
    pub fn for_language(language: Language) -> &'static LanguageProfile {
        match language {
            Language::Cpp => &CPP,
            Language::C => &C,
            Language::Java => &JAVA,
            Language::Python => &PYTHON,
            Language::JavaScript => &JAVASCRIPT,
            Language::TypeScript => &TYPESCRIPT,
            Language::CSharp => &CSHARP,
            Language::Go => &GO,
            Language::Rust => &RUST,
            Language::Php => &PHP,
            Language::Ruby => &RUBY,
            Language::Kotlin => &KOTLIN,
            Language::Swift => &SWIFT,
        }
    }

    /// Whether the language has a separate compile step
    pub fn is_compiled(&self) -> bool {
        self.compile.is_some()
    }

    /// Commands that must be on PATH for local execution
    pub fn required_programs(&self) -> Vec<&'static str> {
        let mut programs = Vec::new();
        if let Some(compile) = &self.compile {
            programs.push(compile.program());
        }
        let run = self.run.program();
        if !run.starts_with('{') && !programs.contains(&run) {
            programs.push(run);
        }
        programs
    }
}

static CPP: LanguageProfile = LanguageProfile {
    language: Language::Cpp,
    remote_id: 54,
    source_file: "main.cpp",
    executable_file: Some("main"),
    compile: Some(CommandTemplate::new(&["g++", "-std=c++17", "-O2", "-o", "{exe}", "{src}"])),
    run: CommandTemplate::new(&["{exe}"]),
};

static C: LanguageProfile = LanguageProfile {
    language: Language::C,
    remote_id: 50,
    source_file: "main.c",
    executable_file: Some("main"),
    compile: Some(CommandTemplate::new(&["gcc", "-O2", "-o", "{exe}", "{src}", "-lm"])),
    run: CommandTemplate::new(&["{exe}"]),
};

static JAVA: LanguageProfile = LanguageProfile {
    language: Language::Java,
    remote_id: 62,
    source_file: "Main.java",
    executable_file: None,
    compile: Some(CommandTemplate::new(&["javac", "{src}"])),
    run: CommandTemplate::new(&["java", "-cp", "{dir}", "Main"]),
};

static PYTHON: LanguageProfile = LanguageProfile {
    language: Language::Python,
    remote_id: 71,
    source_file: "main.py",
    executable_file: None,
    compile: None,
    run: CommandTemplate::new(&["python3", "{src}"]),
};

static JAVASCRIPT: LanguageProfile = LanguageProfile {
    language: Language::JavaScript,
    remote_id: 63,
    source_file: "main.js",
    executable_file: None,
    compile: None,
    run: CommandTemplate::new(&["node", "{src}"]),
};

static TYPESCRIPT: LanguageProfile = LanguageProfile {
    language: Language::TypeScript,
    remote_id: 74,
    source_file: "main.ts",
    executable_file: None,
    compile: None,
    run: CommandTemplate::new(&["ts-node", "{src}"]),
};

static CSHARP: LanguageProfile = LanguageProfile {
    language: Language::CSharp,
    remote_id: 51,
    source_file: "main.cs",
    executable_file: Some("main.exe"),
    compile: Some(CommandTemplate::new(&["mcs", "-out:{exe}", "{src}"])),
    run: CommandTemplate::new(&["mono", "{exe}"]),
};

static GO: LanguageProfile = LanguageProfile {
    language: Language::Go,
    remote_id: 60,
    source_file: "main.go",
    executable_file: None,
    compile: None,
    run: CommandTemplate::new(&["go", "run", "{src}"]),
};

static RUST: LanguageProfile = LanguageProfile {
    language: Language::Rust,
    remote_id: 73,
    source_file: "main.rs",
    executable_file: Some("main"),
    compile: Some(CommandTemplate::new(&["rustc", "-O", "-o", "{exe}", "{src}"])),
    run: CommandTemplate::new(&["{exe}"]),
};

static PHP: LanguageProfile = LanguageProfile {
    language: Language::Php,
    remote_id: 68,
    source_file: "main.php",
    executable_file: None,
    compile: None,
    run: CommandTemplate::new(&["php", "{src}"]),
};

static RUBY: LanguageProfile = LanguageProfile {
    language: Language::Ruby,
    remote_id: 72,
    source_file: "main.rb",
    executable_file: None,
    compile: None,
    run: CommandTemplate::new(&["ruby", "{src}"]),
};

static KOTLIN: LanguageProfile = LanguageProfile {
    language: Language::Kotlin,
    remote_id: 78,
    source_file: "main.kt",
    executable_file: Some("main.jar"),
    compile: Some(CommandTemplate::new(&["kotlinc", "{src}", "-include-runtime", "-d", "{exe}"])),
    run: CommandTemplate::new(&["java", "-jar", "{exe}"]),
};

static SWIFT: LanguageProfile = LanguageProfile {
    language: Language::Swift,
    remote_id: 83,
    source_file: "main.swift",
    executable_file: None,
    compile: None,
    run: CommandTemplate::new(&["swift", "{src}"]),
};

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::path::PathBuf;

    #[test]
    fn test_every_language_has_a_distinct_profile() {
        let mut ids = HashSet::new();
        for language in Language::ALL {
            let profile = LanguageProfile::for_language(language);
            assert_eq!(profile.language, language);
            assert!(ids.insert(profile.remote_id), "duplicate id for {}", language);
        }
    }

    #[test]
    fn test_render_substitutes_paths() {
        let profile = LanguageProfile::for_language(Language::Cpp);
        let dir = PathBuf::from("/tmp/run-1");
        let src = dir.join("main.cpp");
        let exe = dir.join("main");

        let (program, args) = profile.compile.unwrap().render(&dir, &src, Some(&exe));
        assert_eq!(program, "g++");
        assert!(args.contains(&"/tmp/run-1/main".to_string()));
        assert!(args.contains(&"/tmp/run-1/main.cpp".to_string()));

        let (program, args) = profile.run.render(&dir, &src, Some(&exe));
        assert_eq!(program, "/tmp/run-1/main");
        assert!(args.is_empty());
    }

    #[test]
    fn test_required_programs() {
        assert_eq!(
            LanguageProfile::for_language(Language::Cpp).required_programs(),
            vec!["g++"]
        );
        assert_eq!(
            LanguageProfile::for_language(Language::Kotlin).required_programs(),
            vec!["kotlinc", "java"]
        );
        assert!(!LanguageProfile::for_language(Language::Python).is_compiled());
    }
}
