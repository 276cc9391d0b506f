/// Repositories suggested on the input view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleRepository {
    pub name: &'static str,
    pub url: &'static str,
    pub description: &'static str,
    pub complexity: &'static str,
    pub files: usize,
}

pub const SAMPLES: [SampleRepository; 3] = [
    SampleRepository {
        name: "Python CPython Tools",
        url: "https://github.com/python/cpython.git",
        description: "Python interpreter source code with various Python utilities",
        complexity: "Complex",
        files: 50,
    },
    SampleRepository {
        name: "Simple Python Scripts",
        url: "https://github.com/geekcomputers/Python.git",
        description: "Collection of Python utilities and automation scripts",
        complexity: "Simple",
        files: 10,
    },
    SampleRepository {
        name: "Python Algorithms",
        url: "https://github.com/TheAlgorithms/Python.git",
        description: "Comprehensive collection of Python algorithms and data structures",
        complexity: "Medium",
        files: 25,
    },
];

pub fn render() -> String {
    let mut out = String::from("Sample repositories:\n\n");
    for sample in &SAMPLES {
        out.push_str(&format!(
            "  {} ({}, ~{} files)\n    {}\n    {}\n\n",
            sample.name, sample.complexity, sample.files, sample.url, sample.description
        ));
    }
    out
}
