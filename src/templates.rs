//! Starter documents and the default document body

/// Names of the built-in templates, in picker order
pub const TEMPLATE_NAMES: &[&str] = &["Blank", "Lecture Notes", "Code Snippets", "Formula Sheet"];

const LECTURE_NOTES: &str = r#"# Week X — Topic Title

## Key Ideas
- Concept 1
- Concept 2

## Definitions
- **Term**: meaning here

## Example
Let $f(x)=x^2-x$. Then $$f'(x)=2x-1$$

## Quick Derivation
1. Start from ...
2. Apply rule ...

## Takeaways
- Bullet 1
- Bullet 2
"#;

const CODE_SNIPPETS: &str = r#"# Handy Snippets

### Python
```python
from math import sqrt
def mean(xs):
    return sum(xs)/len(xs)
```

### Bash
```bash
python -m venv .venv && source .venv/bin/activate
pip install -r requirements.txt
```

### SQL
```sql
SELECT id, AVG(score) AS avg_score
FROM results
GROUP BY id;
```
"#;

const FORMULA_SHEET: &str = r#"# Formula Sheet

## Algebra
$ (a+b)^2 = a^2 + 2ab + b^2 $\
$ (a-b)^2 = a^2 - 2ab + b^2 $\
$ a^2-b^2=(a-b)(a+b) $

## Calculus
$\dfrac{d}{dx} x^n = nx^{n-1}$\
$\int_0^1 x^2\,dx = 1/3$

## Trig
$\sin^2 x + \cos^2 x = 1$
"#;

/// Body the editor starts with
pub const DEFAULT_DOCUMENT: &str = r#"# A4 Markdown Writer

Switch orientation, pick columns, then Print → Save as PDF.

---

## Math
Inline: $E=mc^2$  Display: $$\int_0^1 x^2\,dx=1/3$$

## Code
```python
import math
print("hello", math.pi)
```

## Lists
- One
- Two
- Three
"#;

/// Look up a template body by display name
pub fn template_body(name: &str) -> Option<&'static str> {
    match name {
        "Blank" => Some(""),
        "Lecture Notes" => Some(LECTURE_NOTES),
        "Code Snippets" => Some(CODE_SNIPPETS),
        "Formula Sheet" => Some(FORMULA_SHEET),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::DocumentTransformer;

    #[test]
    fn test_every_named_template_resolves() {
        for name in TEMPLATE_NAMES {
            assert!(template_body(name).is_some(), "missing template {}", name);
        }
        assert!(template_body("Nope").is_none());
    }

    #[test]
    fn test_templates_transform_cleanly() {
        let transformer = DocumentTransformer::default();
        for name in TEMPLATE_NAMES {
            let body = template_body(name).unwrap();
            let tree = transformer.transform(body);
            if !body.is_empty() {
                assert!(!tree.is_empty(), "template {} produced no nodes", name);
            }
        }
    }

    #[test]
    fn test_default_document_has_expected_blocks() {
        let tree = DocumentTransformer::default().transform(DEFAULT_DOCUMENT);
        let kinds: Vec<_> = tree.nodes.iter().map(|n| &n.kind).collect();
        assert!(kinds
            .iter()
            .any(|k| matches!(k, crate::content::NodeKind::CodeBlock { .. })));
        assert!(kinds
            .iter()
            .any(|k| matches!(k, crate::content::NodeKind::Rule)));
    }
}
