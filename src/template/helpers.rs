use handlebars::{handlebars_helper, Handlebars};

// 每单位时间的量换算为每分钟
handlebars_helper!(per_minute: |v: f64| v / 60.0);
handlebars_helper!(upper: |s: str| s.to_uppercase());
handlebars_helper!(lower: |s: str| s.to_lowercase());
handlebars_helper!(trim: |s: str| s.trim().to_string());
handlebars_helper!(replace: |s: str, from: str, to: str| s.replace(from, to));
handlebars_helper!(fixed: |v: f64, precision: u64| format!("{:.*}", precision as usize, v));
handlebars_helper!(round: |v: f64| v.round());

/// 注册描述模板可用的全部 helper
pub fn register(registry: &mut Handlebars<'_>) {
    registry.register_helper("per_minute", Box::new(per_minute));
    registry.register_helper("upper", Box::new(upper));
    registry.register_helper("lower", Box::new(lower));
    registry.register_helper("trim", Box::new(trim));
    registry.register_helper("replace", Box::new(replace));
    registry.register_helper("fixed", Box::new(fixed));
    registry.register_helper("round", Box::new(round));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn render(template: &str, data: serde_json::Value) -> String {
        let mut hb = Handlebars::new();
        register(&mut hb);
        hb.render_template(template, &data).unwrap()
    }

    #[test]
    fn per_minute_divides_by_sixty() {
        assert_eq!(render("{{fixed (per_minute v) 2}}", json!({"v": 90})), "1.50");
    }

    #[test]
    fn text_helpers() {
        assert_eq!(render("{{upper s}}", json!({"s": "gva"})), "GVA");
        assert_eq!(render("{{lower s}}", json!({"s": "MiB"})), "mib");
        assert_eq!(render("[{{trim s}}]", json!({"s": "  x "})), "[x]");
        assert_eq!(
            render("{{replace s \"-\" \" \"}}", json!({"s": "ch-gva-2"})),
            "ch gva 2"
        );
    }

    #[test]
    fn fixed_formats_precision() {
        assert_eq!(render("{{fixed v 3}}", json!({"v": 43.962005025946798})), "43.962");
        assert_eq!(render("{{fixed v 1}}", json!({"v": 2.75})), "2.8");
    }

    #[test]
    fn fixed_rejects_non_numbers() {
        let mut hb = Handlebars::new();
        register(&mut hb);
        assert!(hb
            .render_template("{{fixed v 2}}", &json!({"v": "abc"}))
            .is_err());
    }
}
