//! Selection of the methods a tool works on, from `--filter-class` and
//! `--filter-method` regular expressions.

use crate::prelude::*;
use clap::ArgMatches;
use regex::Regex;

#[derive(Debug, Default)]
pub struct MethodFilter {
    class: Option<Regex>,
    method: Option<Regex>,
}

impl MethodFilter {
    pub fn new(class: Option<&str>, method: Option<&str>) -> DlResult<Self> {
        Ok(Self {
            class: class.map(Regex::new).transpose()?,
            method: method.map(Regex::new).transpose()?,
        })
    }

    pub fn from_args(args: &ArgMatches) -> DlResult<Self> {
        Self::new(
            args.get_one::<String>("filter-class").map(String::as_str),
            args.get_one::<String>("filter-method").map(String::as_str),
        )
    }

    /// Matching methods carrying a body, in class then declaration order.
    pub fn select<'a>(&'a self, repo: &'a Repo) -> Vec<&'a MethodDef> {
        let classes: Box<dyn Iterator<Item = &ClassDef>> = if let Some(r) = &self.class {
            Box::new(repo.find_classes(r))
        } else {
            Box::new(repo.iter_classes())
        };
        let methods: Box<dyn Iterator<Item = &MethodDef>> = if let Some(r) = &self.method {
            Box::new(classes.flat_map(|class| class.find_methods(r)))
        } else {
            Box::new(classes.flat_map(ClassDef::iter_methods))
        };
        methods.filter(|method| method.code().is_some()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unitfile;

    const UNIT: &str = r#"{
        "classes": [
            {
                "name": "a/Main",
                "methods": [
                    { "name": "main", "proto": "()V", "flags": ["static"] },
                    { "name": "helper", "proto": "()V", "flags": ["static"] },
                    { "name": "stub", "proto": "()V", "flags": ["native"] }
                ]
            },
            {
                "name": "b/Util",
                "methods": [{ "name": "help", "proto": "()V", "flags": ["static"] }]
            }
        ],
        "bodies": [
            { "class": "a/Main", "method": "main()V", "code": { "registers_size": 0, "ins_size": 0, "insns": [14] } },
            { "class": "a/Main", "method": "helper()V", "code": { "registers_size": 0, "ins_size": 0, "insns": [14] } },
            { "class": "b/Util", "method": "help()V", "code": { "registers_size": 0, "ins_size": 0, "insns": [14] } }
        ]
    }"#;

    fn names(filter: &MethodFilter, repo: &Repo) -> Vec<String> {
        filter.select(repo).into_iter().map(MethodDef::signature).collect()
    }

    #[test]
    fn selection() {
        let repo = unitfile::load_str(UNIT).unwrap();
        assert_eq!(names(&MethodFilter::default(), &repo).len(), 3);
        assert_eq!(
            names(&MethodFilter::new(Some("^b/"), None).unwrap(), &repo),
            vec!["Lb/Util;->help()V"]
        );
        assert_eq!(
            names(&MethodFilter::new(None, Some("^help")).unwrap(), &repo),
            vec!["La/Main;->helper()V", "Lb/Util;->help()V"]
        );
        assert!(matches!(
            MethodFilter::new(Some("("), None),
            Err(DlError::Regex(_))
        ));
    }
}
