use std::collections::BTreeMap;
use std::fmt::Write;

use records::{Entity, FieldValue, NUMERIC_SUFFIX};
use serde::{Deserialize, Serialize};
use template::{Template, TemplateError, Value};
use tracing::warn;

/// Leading fields the default card leaves out (coordinates and name).
pub const SKIPPED_DETAIL_FIELDS: usize = 3;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CardSize {
    XxSmall,
    XSmall,
    Small,
    #[default]
    Medium,
    Large,
}

impl CardSize {
    pub fn as_str(self) -> &'static str {
        match self {
            CardSize::XxSmall => "xx-small",
            CardSize::XSmall => "x-small",
            CardSize::Small => "small",
            CardSize::Medium => "medium",
            CardSize::Large => "large",
        }
    }

    /// Card width in pixels before scaling.
    pub fn width_px(self) -> f64 {
        match self {
            CardSize::XxSmall => 80.0,
            CardSize::XSmall => 100.0,
            CardSize::Small => 120.0,
            CardSize::Medium => 150.0,
            CardSize::Large => 180.0,
        }
    }

    /// Smaller cards allow more of them on screen.
    pub fn max_visible_multiplier(self) -> f64 {
        match self {
            CardSize::XxSmall => 2.5,
            CardSize::XSmall => 2.0,
            CardSize::Small => 1.5,
            CardSize::Medium => 1.0,
            CardSize::Large => 0.7,
        }
    }

    pub fn max_details(self) -> usize {
        match self {
            CardSize::XxSmall => 1,
            CardSize::XSmall => 2,
            CardSize::Small => 3,
            CardSize::Medium => 5,
            CardSize::Large => 7,
        }
    }

    /// The two smallest sizes print detail values without their labels.
    pub fn labels_details(self) -> bool {
        !matches!(self, CardSize::XxSmall | CardSize::XSmall)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CardOptions {
    pub size: CardSize,
    pub show_avatar: bool,
    pub show_details: bool,
    pub show_metrics: bool,
    pub metric_label: String,
}

impl Default for CardOptions {
    fn default() -> Self {
        Self {
            size: CardSize::Medium,
            show_avatar: true,
            show_details: true,
            show_metrics: true,
            metric_label: "Value".to_string(),
        }
    }
}

impl CardOptions {
    fn shows_metric(&self, entity: &Entity) -> bool {
        self.show_metrics && entity.size_value.is_some()
    }
}

/// Variables a card template can reference for one entity.
pub fn card_context(entity: &Entity, options: &CardOptions) -> Value {
    let fields = entity
        .fields
        .iter()
        .map(|(k, v)| {
            let value = match v {
                FieldValue::Text(s) => Value::from(s.as_str()),
                FieldValue::Number(n) => Value::Number(*n),
            };
            (k.to_string(), value)
        })
        .collect::<BTreeMap<_, _>>();

    let dimensions = entity
        .raw_dimensions
        .iter()
        .map(|(index, raw)| {
            let cell = Value::mapping([
                ("text", Value::from(raw.text.as_str())),
                ("num", Value::Number(raw.numeric)),
            ]);
            (index.to_string(), cell)
        })
        .collect::<BTreeMap<_, _>>();

    Value::mapping([
        ("name", Value::from(entity.name.as_str())),
        ("initial", Value::from(entity.initial.as_str())),
        ("fields", Value::Mapping(fields)),
        (
            "raw",
            Value::mapping([
                ("dimensions", Value::Mapping(dimensions)),
                ("measures", Value::Mapping(BTreeMap::new())),
            ]),
        ),
        ("sizeValue", Value::from(entity.size_value)),
        ("sizeText", Value::from(entity.size_text.clone())),
        ("cardSize", Value::from(options.size.as_str())),
        ("metricLabel", Value::from(options.metric_label.as_str())),
        ("showAvatar", Value::Bool(options.show_avatar)),
        ("showDetails", Value::Bool(options.show_details)),
        ("showMetrics", Value::Bool(options.shows_metric(entity))),
    ])
}

/// `job_title` -> `Job Title`.
pub fn title_case(key: &str) -> String {
    key.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Built-in card markup.
pub fn default_card_html(entity: &Entity, options: &CardOptions) -> String {
    let mut html = String::from("<div class=\"-card-header\">");
    if options.show_avatar {
        let _ = write!(html, "<div class=\"-avatar\">{}</div>", entity.initial);
    }
    let _ = write!(html, "<div class=\"-name\">{}</div></div>", entity.name);

    if options.show_details {
        html.push_str("<div class=\"-details\">");
        let details = entity
            .fields
            .iter()
            .filter(|(key, _)| !key.ends_with(NUMERIC_SUFFIX))
            .skip(SKIPPED_DETAIL_FIELDS)
            .filter_map(|(key, value)| {
                let text = value.as_text()?;
                (!text.trim().is_empty()).then_some((key, text))
            })
            .take(options.size.max_details());
        for (key, text) in details {
            if options.size.labels_details() {
                let _ = write!(html, "<div><strong>{}:</strong> {text}</div>", title_case(key));
            } else {
                let _ = write!(html, "<div>{text}</div>");
            }
        }
        html.push_str("</div>");
    }

    if options.shows_metric(entity) {
        let _ = write!(
            html,
            "<div class=\"-metric\"><span>{}:</span><span class=\"-metric-value\">{}</span></div>",
            options.metric_label,
            entity.size_text.as_deref().unwrap_or("")
        );
    }
    html
}

/// Markup for one card and where it came from.
#[derive(Debug, Clone, PartialEq)]
pub enum CardBody {
    Template(String),
    Default(String),
    /// The custom template was unusable; this is the default markup.
    Fallback(String),
}

impl CardBody {
    pub fn html(&self) -> &str {
        match self {
            CardBody::Template(s) | CardBody::Default(s) | CardBody::Fallback(s) => s,
        }
    }

    pub fn into_html(self) -> String {
        match self {
            CardBody::Template(s) | CardBody::Default(s) | CardBody::Fallback(s) => s,
        }
    }
}

/// Renders card bodies with an optional custom template parsed once.
#[derive(Debug, Clone)]
pub struct CardRenderer {
    options: CardOptions,
    template: Option<Result<Template, TemplateError>>,
}

impl CardRenderer {
    pub fn new(options: CardOptions, custom_template: Option<&str>) -> Self {
        let template = custom_template
            .filter(|t| !t.trim().is_empty())
            .map(|source| {
                Template::parse(source).inspect_err(|err| {
                    warn!(error = %err, "custom card template rejected, using default card");
                })
            });
        Self { options, template }
    }

    pub fn options(&self) -> &CardOptions {
        &self.options
    }

    pub fn render(&self, entity: &Entity) -> CardBody {
        match &self.template {
            Some(Ok(template)) => {
                CardBody::Template(template.render(&card_context(entity, &self.options)))
            }
            Some(Err(_)) => CardBody::Fallback(default_card_html(entity, &self.options)),
            None => CardBody::Default(default_card_html(entity, &self.options)),
        }
    }
}

#[cfg(test)]
mod tests {
    use cube::{Cell, CubeDescriptor, Matrix};
    use foundation::ElementId;
    use pretty_assertions::assert_eq;
    use records::{ColumnMapping, Entity, PositionOverrides, normalize};

    use super::{CardBody, CardOptions, CardRenderer, CardSize, default_card_html, title_case};

    fn sample(size: Option<f64>) -> Entity {
        let desc = CubeDescriptor::from_names(
            ["Latitude", "Longitude", "Name", "Job Title", "Company", "Empty"],
            ["Sales"],
            1,
        );
        let mut row = vec![
            Cell::number(59.9, ElementId(0)),
            Cell::number(10.7, ElementId(1)),
            Cell::text("oslo", ElementId(2)),
            Cell::text("Mayor", ElementId(3)),
            Cell::text("City Hall", ElementId(4)),
            Cell::text("  ", ElementId(5)),
        ];
        if let Some(s) = size {
            row.push(Cell::new("1.2k", s, ElementId::UNSELECTABLE));
        }
        let report = normalize(
            &Matrix::from_cells(vec![row]),
            &desc.dimensions,
            ColumnMapping::default(),
            &PositionOverrides::new(),
        );
        report.entities.into_iter().next().unwrap()
    }

    #[test]
    fn title_cases_snake_keys() {
        assert_eq!(title_case("job_title"), "Job Title");
        assert_eq!(title_case("x"), "X");
    }

    #[test]
    fn default_card_lists_details_after_basic_fields() {
        let html = default_card_html(&sample(Some(1200.0)), &CardOptions::default());
        assert_eq!(
            html,
            "<div class=\"-card-header\"><div class=\"-avatar\">O</div>\
             <div class=\"-name\">oslo</div></div>\
             <div class=\"-details\"><div><strong>Job Title:</strong> Mayor</div>\
             <div><strong>Company:</strong> City Hall</div></div>\
             <div class=\"-metric\"><span>Value:</span><span class=\"-metric-value\">1.2k</span></div>"
        );
    }

    #[test]
    fn small_cards_show_fewer_unlabelled_details() {
        let options = CardOptions {
            size: CardSize::XxSmall,
            show_avatar: false,
            show_metrics: true,
            ..CardOptions::default()
        };
        let html = default_card_html(&sample(None), &options);
        assert_eq!(
            html,
            "<div class=\"-card-header\"><div class=\"-name\">oslo</div></div>\
             <div class=\"-details\"><div>Mayor</div></div>"
        );
    }

    #[test]
    fn custom_template_sees_context() {
        let renderer = CardRenderer::new(
            CardOptions::default(),
            Some("{{name}}|{{fields.job_title}}|{{raw.dimensions.0.num}}|{{#if showMetrics}}{{metricLabel}}={{sizeValue}}{{/if}}|{{cardSize}}"),
        );
        let body = renderer.render(&sample(Some(7.0)));
        assert_eq!(body, CardBody::Template("oslo|Mayor|59.9|Value=7|medium".to_string()));

        let no_metric = renderer.render(&sample(None));
        assert_eq!(no_metric.html(), "oslo|Mayor|59.9||medium");
    }

    #[test]
    fn text_dimensions_have_no_numeric_shadow() {
        let renderer = CardRenderer::new(
            CardOptions::default(),
            Some("[{{fields.job_title_num}}][{{fields.latitude_num}}]"),
        );
        assert_eq!(renderer.render(&sample(None)).html(), "[][59.9]");
    }

    #[test]
    fn unusable_template_falls_back() {
        let source = "{{#each xs}}".repeat(64);
        let renderer = CardRenderer::new(CardOptions::default(), Some(&source));
        let entity = sample(None);
        let body = renderer.render(&entity);
        assert_eq!(
            body,
            CardBody::Fallback(default_card_html(&entity, renderer.options()))
        );

        let blank = CardRenderer::new(CardOptions::default(), Some("   "));
        assert!(matches!(blank.render(&entity), CardBody::Default(_)));
    }
}
