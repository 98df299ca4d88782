//! Shared sample records for integration tests.

#![allow(dead_code)]

/// The EPR paper as doi.org returns it: one line, en-dash page range,
/// spelled-out journal and a DOI-style key.
pub const EPR_FROM_DOI: &str = " @article{Einstein_1935, title={Can Quantum-Mechanical Description of Physical Reality Be Considered Complete?}, volume={47}, ISSN={0031-899X}, url={http://dx.doi.org/10.1103/PhysRev.47.777}, DOI={10.1103/physrev.47.777}, number={10}, journal={Physical Review}, publisher={American Physical Society (APS)}, author={Einstein, A. and Podolsky, B. and Rosen, N.}, year={1935}, month=may, pages={777–780} }\n";

/// A record exported from a reference manager, with metadata fields and
/// LaTeX written in several styles.
pub const MANAGER_EXPORT: &str = r#"% exported by a reference manager
@article{schrodinger1926,
    author = {Schr\"{o}dinger, E. and Erwin~Madelung},
    title = {Quantisierung als Eigenwertproblem},
    journal = "Annalen der Physik",
    year = 1926,
    month = jan,
    pages = {361--376},
    abstract = {In this communication I wish to show...},
    keywords = {wave mechanics},
    date-added = {2020-01-01 10:00:00 +0000},
    file = {schrodinger.pdf}
}
"#;

/// An already cleaned record with a curated key.
pub const CURATED: &str = "@article{Einstein:1935Qx,
 author = {Einstein, A. and Podolsky, B. and Rosen, N.},
 journal = {Phys. Rev.},
 pages = {777},
 year = {1935}
}
";

/// A record the normalizer must reject: no author field.
pub const NO_AUTHOR: &str = "@misc{anon, title = {Untitled}, year = {2001}}";

/// A record the normalizer must reject: no year and no curated key.
pub const NO_YEAR: &str = "@misc{doe, author = {Doe, John}, title = {Undated}}";
