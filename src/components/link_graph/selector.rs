//! Element selectors used by event bindings and style rules.
//!
//! Supports the subset the host actually sends:
//!
//! - group: `node`, `edge`, `*`
//! - id: `#a1`
//! - class: `.highlight`
//! - state: `:selected`, `:unselected`
//! - data: `[label]`, `[label = "Person"]`, `[weight != 5]`
//!
//! Simple selectors can be combined into a list with `,`; an element matches
//! the list if it matches any entry.

use std::str::FromStr;

use nom::{
	IResult,
	branch::alt,
	bytes::complete::{tag, take_while, take_while1},
	character::complete::{char, multispace0, multispace1},
	combinator::{all_consuming, map, opt, peek, value},
	multi::{many0, many1, separated_list1},
	number::complete::double,
	sequence::{delimited, pair, preceded, terminated, tuple},
};
use serde_json::Value;

use super::error::SelectorError;
use super::graph::ElementState;
use super::types::ElementGroup;

/// A parsed selector list.
#[derive(Clone, Debug, PartialEq)]
pub struct Selector {
	alternatives: Vec<SimpleSelector>,
}

#[derive(Clone, Debug, PartialEq)]
struct SimpleSelector {
	group: Option<ElementGroup>,
	filters: Vec<Filter>,
}

#[derive(Clone, Debug, PartialEq)]
enum Filter {
	Id(String),
	Class(String),
	Selected(bool),
	Data {
		key: String,
		test: Option<(Comparison, Literal)>,
	},
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Comparison {
	Eq,
	Ne,
}

#[derive(Clone, Debug, PartialEq)]
enum Literal {
	Str(String),
	Num(f64),
}

impl Selector {
	/// A selector matching every element.
	pub fn all() -> Self {
		Self {
			alternatives: vec![SimpleSelector {
				group: None,
				filters: Vec::new(),
			}],
		}
	}

	/// Parse an optional selector; a missing or blank selector matches everything.
	pub fn parse_optional(input: Option<&str>) -> Result<Self, SelectorError> {
		match input {
			Some(s) if !s.trim().is_empty() => s.parse(),
			_ => Ok(Self::all()),
		}
	}

	/// Whether any alternative matches `state`.
	pub fn matches(&self, state: &ElementState<'_>) -> bool {
		self.alternatives.iter().any(|s| s.matches(state))
	}
}

impl FromStr for Selector {
	type Err = SelectorError;

	fn from_str(input: &str) -> Result<Self, Self::Err> {
		match all_consuming(delimited(multispace0, selector_list, multispace0))(input) {
			Ok((_, alternatives)) => Ok(Self { alternatives }),
			Err(_) => Err(SelectorError {
				input: input.to_string(),
			}),
		}
	}
}

impl SimpleSelector {
	fn matches(&self, state: &ElementState<'_>) -> bool {
		if self.group.is_some_and(|g| g != state.element.group) {
			return false;
		}
		self.filters.iter().all(|f| f.matches(state))
	}
}

impl Filter {
	fn matches(&self, state: &ElementState<'_>) -> bool {
		match self {
			Filter::Id(id) => state.element.id == *id,
			Filter::Class(class) => state.classes.contains(class),
			Filter::Selected(selected) => state.selected == *selected,
			Filter::Data { key, test } => {
				let Some(actual) = state.element.data.get(key) else {
					return false;
				};
				match test {
					None => !actual.is_null(),
					Some((Comparison::Eq, literal)) => literal.equals(actual),
					Some((Comparison::Ne, literal)) => !literal.equals(actual),
				}
			}
		}
	}
}

impl Literal {
	fn equals(&self, actual: &Value) -> bool {
		match (self, actual) {
			(Literal::Str(s), Value::String(v)) => s == v,
			(Literal::Num(n), Value::Number(v)) => v.as_f64() == Some(*n),
			(Literal::Num(n), Value::String(v)) => v.parse::<f64>().ok() == Some(*n),
			(Literal::Str(s), Value::Bool(b)) => s == if *b { "true" } else { "false" },
			_ => false,
		}
	}
}

fn selector_list(input: &str) -> IResult<&str, Vec<SimpleSelector>> {
	separated_list1(delimited(multispace0, char(','), multispace0), simple_selector)(input)
}

fn simple_selector(input: &str) -> IResult<&str, SimpleSelector> {
	alt((
		map(pair(group, many0(filter)), |(group, filters)| SimpleSelector {
			group,
			filters,
		}),
		map(many1(filter), |filters| SimpleSelector {
			group: None,
			filters,
		}),
	))(input)
}

fn group(input: &str) -> IResult<&str, Option<ElementGroup>> {
	alt((
		value(Some(ElementGroup::Nodes), tag("node")),
		value(Some(ElementGroup::Edges), tag("edge")),
		value(None, tag("*")),
	))(input)
}

fn filter(input: &str) -> IResult<&str, Filter> {
	alt((
		map(preceded(char('#'), ident), |id| Filter::Id(id.to_string())),
		map(preceded(char('.'), ident), |class| {
			Filter::Class(class.to_string())
		}),
		preceded(
			char(':'),
			alt((
				value(Filter::Selected(true), tag("selected")),
				value(Filter::Selected(false), tag("unselected")),
			)),
		),
		data_filter,
	))(input)
}

fn data_filter(input: &str) -> IResult<&str, Filter> {
	map(
		delimited(
			char('['),
			tuple((
				delimited(multispace0, ident, multispace0),
				opt(pair(
					comparison,
					delimited(multispace0, literal, multispace0),
				)),
			)),
			char(']'),
		),
		|(key, test)| Filter::Data {
			key: key.to_string(),
			test,
		},
	)(input)
}

fn comparison(input: &str) -> IResult<&str, Comparison> {
	alt((
		value(Comparison::Ne, tag("!=")),
		value(Comparison::Eq, tag("=")),
	))(input)
}

fn literal(input: &str) -> IResult<&str, Literal> {
	alt((
		map(delimited(char('"'), take_while(|c: char| c != '"'), char('"')), |s: &str| {
			Literal::Str(s.to_string())
		}),
		map(delimited(char('\''), take_while(|c: char| c != '\''), char('\'')), |s: &str| {
			Literal::Str(s.to_string())
		}),
		// `double` also takes `inf`/`nan` prefixes; a number must end the value.
		map(terminated(double, peek(alt((multispace1, tag("]"))))), Literal::Num),
		map(ident, |s| Literal::Str(s.to_string())),
	))(input)
}

fn ident(input: &str) -> IResult<&str, &str> {
	take_while1(|c: char| c.is_alphanumeric() || c == '_' || c == '-')(input)
}

#[cfg(test)]
mod tests {
	use std::collections::BTreeSet;

	use serde_json::json;

	use super::*;
	use crate::components::link_graph::types::Element;

	fn element(group: ElementGroup, data: Value) -> Element {
		Element::from_data(group, data.as_object().cloned().unwrap_or_default()).unwrap()
	}

	fn check(selector: &str, element: &Element, classes: &[&str], selected: bool) -> bool {
		let classes: BTreeSet<String> = classes.iter().map(|c| c.to_string()).collect();
		let state = ElementState {
			element,
			classes: &classes,
			selected,
		};
		selector.parse::<Selector>().unwrap().matches(&state)
	}

	#[test]
	fn group_selectors() {
		let node = element(ElementGroup::Nodes, json!({"id": "a"}));
		assert!(check("node", &node, &[], false));
		assert!(!check("edge", &node, &[], false));
		assert!(check("*", &node, &[], false));
		assert!(check("edge, node", &node, &[], false));
	}

	#[test]
	fn class_id_and_state() {
		let edge = element(ElementGroup::Edges, json!({"id": "e1"}));
		assert!(check("edge.highlight", &edge, &["highlight"], false));
		assert!(!check(".highlight", &edge, &[], false));
		assert!(check("#e1", &edge, &[], false));
		assert!(check("edge:selected", &edge, &[], true));
		assert!(check(":unselected", &edge, &[], false));
	}

	#[test]
	fn data_comparisons() {
		let node = element(
			ElementGroup::Nodes,
			json!({"id": "a", "label": "Person", "age": 30}),
		);
		assert!(check("node[label = \"Person\"]", &node, &[], false));
		assert!(check("node[label='Person']", &node, &[], false));
		assert!(check("node[label=Person]", &node, &[], false));
		assert!(check("[age = 30]", &node, &[], false));
		assert!(check("[age != 31]", &node, &[], false));
		assert!(check("[label]", &node, &[], false));
		assert!(!check("[missing]", &node, &[], false));
		assert!(!check("node[label = \"Org\"]", &node, &[], false));
	}

	#[test]
	fn bare_words_that_start_like_numbers() {
		let node = element(
			ElementGroup::Nodes,
			json!({"id": "a", "type": "info", "name": "nancy", "tier": "Infinity", "age": 30}),
		);
		assert!(check("node[type=info]", &node, &[], false));
		assert!(check("[name = nancy]", &node, &[], false));
		assert!(check("[tier=Infinity]", &node, &[], false));
		assert!(check("[age=30]", &node, &[], false));
		assert!(check("[age = 30 ]", &node, &[], false));
		assert!(!check("[type=information]", &node, &[], false));
	}

	#[test]
	fn rejects_garbage() {
		assert!("nodes".parse::<Selector>().is_err());
		assert!("node[".parse::<Selector>().is_err());
		assert!("".parse::<Selector>().is_err());
		assert_eq!(Selector::parse_optional(Some("  ")), Ok(Selector::all()));
	}
}
