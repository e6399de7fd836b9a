use chrono::NaiveDate;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Odoo 发票分类 (sale_layout.category, 发票中的 "Section")
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceCategory {
    #[serde(default, skip_serializing_if = "is_zero")]
    pub id: i64,
    #[serde(default, deserialize_with = "string_or_false")]
    pub name: String,
    #[serde(default)]
    pub sequence: i64,
    #[serde(default, rename = "pagebreak")]
    pub page_break: bool,
    #[serde(default)]
    pub separator: bool,
    #[serde(default)]
    pub subtotal: bool,
}

impl InvoiceCategory {
    /// 比较所有同步字段 (id, name, pagebreak, separator, sequence, subtotal)
    pub fn is_same(&self, other: &InvoiceCategory) -> bool {
        self.id == other.id
            && self.name == other.name
            && self.page_break == other.page_break
            && self.separator == other.separator
            && self.sequence == other.sequence
            && self.subtotal == other.subtotal
    }
}

/// Odoo 的多对一引用, 线上格式为 `[id, "name"]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeId {
    pub id: i64,
    pub name: String,
}

impl Serialize for CompositeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (self.id, &self.name).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for CompositeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let values = Vec::<Value>::deserialize(deserializer)?;
        if values.len() != 2 {
            return Err(D::Error::custom(format!(
                "expected 2 elements in slice, got {}",
                values.len()
            )));
        }
        let id = values[0]
            .as_i64()
            .or_else(|| values[0].as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
            .ok_or_else(|| {
                D::Error::custom(format!(
                    "expected first value to be a full number, got {}",
                    values[0]
                ))
            })?;
        let name = values[1].as_str().ok_or_else(|| {
            D::Error::custom(format!(
                "expected second value to be of type string, got {}",
                values[1]
            ))
        })?;
        Ok(CompositeId {
            id,
            name: name.to_string(),
        })
    }
}

/// Odoo 合作伙伴 (res.partner, 即客户)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partner {
    pub id: i64,
    #[serde(default, deserialize_with = "string_or_false")]
    pub name: String,
    #[serde(rename = "parent_id", default, deserialize_with = "composite_id_or_false")]
    pub parent: Option<CompositeId>,
    #[serde(
        rename = "property_payment_term",
        default,
        deserialize_with = "composite_id_or_false"
    )]
    pub payment_term: Option<CompositeId>,
}

impl Partner {
    /// 发票抬头名称: 有上级组织时使用上级名称 (汇总开票)
    pub fn billing_name(&self) -> &str {
        match &self.parent {
            Some(parent) => &parent.name,
            None => &self.name,
        }
    }
}

/// Odoo 发票 (account.invoice)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    #[serde(default, skip_serializing_if = "is_zero")]
    pub id: i64,
    /// 发票标题, 也是 PDF 中的 "Reference" 字段
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(rename = "date_invoice", default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    /// draft, proforma2, open, cancel, paid
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub state: String,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub user_id: i64,
    #[serde(rename = "payment_term", default, skip_serializing_if = "is_zero")]
    pub payment_term_id: i64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub account_id: i64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub currency_id: i64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub journal_id: i64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub partner_id: i64,
}

/// Odoo 发票行 (account.invoice.line)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvoiceLine {
    #[serde(default, skip_serializing_if = "is_zero")]
    pub id: i64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub invoice_id: i64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// 同一 sequence 的分类按行顺序分组显示, 因此行的提交顺序有意义
    #[serde(default)]
    pub sequence: i64,
    #[serde(rename = "price_unit", default)]
    pub price_per_unit: f64,
    #[serde(default)]
    pub quantity: f64,
    /// 百分比
    #[serde(default)]
    pub discount: f64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub account_id: i64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub product_id: i64,
    #[serde(rename = "sale_layout_cat_id", default, skip_serializing_if = "is_zero")]
    pub category_id: i64,
    #[serde(
        rename = "invoice_line_tax_id",
        default,
        skip_serializing_if = "Vec::is_empty",
        serialize_with = "serialize_tax_ids"
    )]
    pub tax_ids: Vec<i64>,
}

fn is_zero(v: &i64) -> bool {
    *v == 0
}

/// many2many 替换命令: `[[6, 0, [ids]]]`
fn serialize_tax_ids<S: Serializer>(ids: &[i64], serializer: S) -> Result<S::Ok, S::Error> {
    [(6, 0, ids)].serialize(serializer)
}

/// Odoo 对未设置的字段返回 `false` 而不是 null
fn string_or_false<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Flag(#[allow(dead_code)] bool),
    }
    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Text(s)) => s,
        Some(Raw::Flag(_)) | None => String::new(),
    })
}

fn composite_id_or_false<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<CompositeId>, D::Error> {
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Bool(false)) | Some(Value::Null) => Ok(None),
        Some(v) => CompositeId::deserialize(v).map(Some).map_err(D::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn composite_id_round_trips_as_pair() {
        let subject = CompositeId {
            id: 2,
            name: "10 Days".to_string(),
        };
        let marshalled = serde_json::to_value(&subject).unwrap();
        assert_eq!(marshalled, json!([2, "10 Days"]));
        let back: CompositeId = serde_json::from_value(marshalled).unwrap();
        assert_eq!(back, subject);
    }

    #[test]
    fn composite_id_rejects_malformed_pairs() {
        assert!(serde_json::from_value::<CompositeId>(json!([2.5, "test"])).is_err());
        assert!(serde_json::from_value::<CompositeId>(json!(["2", "test"])).is_err());
        assert!(serde_json::from_value::<CompositeId>(json!([2, 3])).is_err());
        assert!(serde_json::from_value::<CompositeId>(json!([2])).is_err());
        assert!(serde_json::from_value::<CompositeId>(json!([2.0, "whole"])).is_ok());
    }

    #[test]
    fn partner_decodes_false_as_missing_parent() {
        let partner: Partner = serde_json::from_value(json!({
            "id": 19680000,
            "name": "Umbrella Corp Ltd.",
            "parent_id": false,
            "property_payment_term": [2, "10 Days"],
        }))
        .unwrap();

        assert_eq!(partner.parent, None);
        assert_eq!(partner.payment_term.as_ref().map(|t| t.id), Some(2));
        assert_eq!(partner.billing_name(), "Umbrella Corp Ltd.");
    }

    #[test]
    fn partner_with_parent_bills_to_parent() {
        let partner: Partner = serde_json::from_value(json!({
            "id": 42,
            "name": "Umbrella Corp Ltd. Billing Department",
            "parent_id": [19680000, "Umbrella Corp Ltd."],
        }))
        .unwrap();

        assert_eq!(partner.billing_name(), "Umbrella Corp Ltd.");
    }

    #[test]
    fn invoice_category_decodes_unset_name() {
        let ic: InvoiceCategory = serde_json::from_value(json!({
            "id": 12, "name": false, "sequence": 0, "pagebreak": false, "separator": false, "subtotal": true
        }))
        .unwrap();
        assert_eq!(ic.name, "");
        assert!(ic.subtotal);
    }

    #[test]
    fn invoice_line_serializes_odoo_field_names() {
        let line = InvoiceLine {
            invoice_id: 7,
            name: "Memory".to_string(),
            price_per_unit: 1.5,
            quantity: 1.0,
            product_id: 660,
            category_id: 12,
            tax_ids: vec![3],
            ..InvoiceLine::default()
        };

        let v = serde_json::to_value(&line).unwrap();
        assert_eq!(v["price_unit"], json!(1.5));
        assert_eq!(v["sale_layout_cat_id"], json!(12));
        assert_eq!(v["invoice_line_tax_id"], json!([[6, 0, [3]]]));
        assert_eq!(v["discount"], json!(0.0));
        assert!(v.get("id").is_none());
    }

    #[test]
    fn invoice_serializes_date_and_skips_unset_ids() {
        let inv = Invoice {
            name: "Umbrella Corp Ltd. APPUiO Cloud December 2021".to_string(),
            date: NaiveDate::from_ymd_opt(2022, 1, 3),
            partner_id: 19680000,
            ..Invoice::default()
        };

        let v = serde_json::to_value(&inv).unwrap();
        assert_eq!(v["date_invoice"], json!("2022-01-03"));
        assert_eq!(v["partner_id"], json!(19680000));
        assert!(v.get("account_id").is_none());
        assert!(v.get("payment_term").is_none());
    }
}
