//! Minimal robots.txt evaluation: user-agent groups with Allow/Disallow
//! rules, `*` wildcards and `$` anchors. The longest matching rule wins and
//! Allow wins ties.

#[derive(Debug, Clone, Default)]
struct Group {
    agents: Vec<String>,
    rules: Vec<Rule>,
}

#[derive(Debug, Clone)]
struct Rule {
    allow: bool,
    pattern: String,
}

#[derive(Debug, Clone)]
pub struct RobotsRules {
    groups: Vec<Group>,
    disallow_all: bool,
}

impl RobotsRules {
    pub fn allow_all() -> Self {
        Self {
            groups: Vec::new(),
            disallow_all: false,
        }
    }

    pub fn disallow_all() -> Self {
        Self {
            groups: Vec::new(),
            disallow_all: true,
        }
    }

    pub fn parse(body: &str) -> Self {
        let mut groups: Vec<Group> = Vec::new();
        let mut current: Option<Group> = None;

        for line in body.lines() {
            let line = line.split('#').next().unwrap_or("").trim();
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim().to_ascii_lowercase();
            let value = value.trim();

            match key.as_str() {
                "user-agent" => {
                    // a user-agent line after rules starts a new group
                    if current.as_ref().map_or(false, |g| !g.rules.is_empty()) {
                        groups.extend(current.take());
                    }
                    current
                        .get_or_insert_with(Group::default)
                        .agents
                        .push(value.to_ascii_lowercase());
                }
                "allow" | "disallow" => {
                    let Some(group) = current.as_mut() else {
                        continue;
                    };
                    // an empty Disallow allows everything
                    if value.is_empty() {
                        continue;
                    }
                    group.rules.push(Rule {
                        allow: key == "allow",
                        pattern: value.to_string(),
                    });
                }
                _ => {}
            }
        }
        groups.extend(current);

        Self {
            groups,
            disallow_all: false,
        }
    }

    pub fn is_allowed(&self, user_agent: &str, path: &str) -> bool {
        if self.disallow_all {
            return false;
        }
        let Some(group) = self.group_for(user_agent) else {
            return true;
        };

        let path = if path.is_empty() { "/" } else { path };
        let mut best: Option<&Rule> = None;
        for rule in group.rules.iter().filter(|r| pattern_matches(&r.pattern, path)) {
            best = match best {
                Some(b)
                    if b.pattern.len() > rule.pattern.len()
                        || (b.pattern.len() == rule.pattern.len() && b.allow) =>
                {
                    Some(b)
                }
                _ => Some(rule),
            };
        }
        best.map_or(true, |rule| rule.allow)
    }

    fn group_for(&self, user_agent: &str) -> Option<&Group> {
        let agent = user_agent.to_ascii_lowercase();
        self.groups
            .iter()
            .find(|g| g.agents.iter().any(|a| a != "*" && agent.contains(a.as_str())))
            .or_else(|| self.groups.iter().find(|g| g.agents.iter().any(|a| a == "*")))
    }
}

fn pattern_matches(pattern: &str, path: &str) -> bool {
    let (pattern, anchored) = match pattern.strip_suffix('$') {
        Some(p) => (p, true),
        None => (pattern, false),
    };
    wildcard_match(pattern.as_bytes(), path.as_bytes(), anchored)
}

/// Glob match with `*` only. Greedy with backtracking to the last star, so
/// time stays linear in `pattern.len() * path.len()`. Unanchored patterns
/// match any prefix of `path`.
fn wildcard_match(pattern: &[u8], path: &[u8], anchored: bool) -> bool {
    let (mut p, mut s) = (0, 0);
    // (pattern index of the last star, path index it currently absorbs up to)
    let mut star: Option<(usize, usize)> = None;

    while s < path.len() {
        if p < pattern.len() && pattern[p] == b'*' {
            star = Some((p, s));
            p += 1;
        } else if p < pattern.len() && pattern[p] == path[s] {
            p += 1;
            s += 1;
        } else if p == pattern.len() && !anchored {
            return true;
        } else if let Some((star_p, star_s)) = star {
            p = star_p + 1;
            s = star_s + 1;
            star = Some((star_p, s));
        } else {
            return false;
        }
    }
    pattern[p..].iter().all(|&c| c == b'*')
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROBOTS: &str = "\
User-agent: *
Disallow: /private/
Allow: /private/open
Disallow: /*.pdf$

User-agent: newsagent
User-agent: otherbot
Disallow: /news/archive
";

    #[test]
    fn wildcard_group_applies_to_unknown_agents() {
        let rules = RobotsRules::parse(ROBOTS);
        assert!(!rules.is_allowed("somebot", "/private/x"));
        assert!(rules.is_allowed("somebot", "/private/open/page"));
        assert!(!rules.is_allowed("somebot", "/files/report.pdf"));
        assert!(rules.is_allowed("somebot", "/files/report.pdf?x=1"));
        assert!(rules.is_allowed("somebot", "/news/archive"));
    }

    #[test]
    fn specific_group_wins_over_wildcard() {
        let rules = RobotsRules::parse(ROBOTS);
        assert!(!rules.is_allowed("newsagent", "/news/archive/2024"));
        assert!(rules.is_allowed("newsagent", "/private/x"));
        assert!(!rules.is_allowed("OtherBot/2.0", "/news/archive"));
    }

    #[test]
    fn empty_disallow_allows_everything() {
        let rules = RobotsRules::parse("User-agent: *\nDisallow:\n");
        assert!(rules.is_allowed("newsagent", "/anything"));
    }

    #[test]
    fn wildcards_and_anchors() {
        assert!(pattern_matches("/a*c", "/abc/d"));
        assert!(pattern_matches("/a*c$", "/abbbc"));
        assert!(!pattern_matches("/a*c$", "/abcd"));
        assert!(pattern_matches("/*", "/"));
        assert!(pattern_matches("*", ""));
        assert!(!pattern_matches("/x", "/"));
        assert!(pattern_matches("/$", "/"));
        assert!(!pattern_matches("/$", "/a"));
        assert!(pattern_matches("/a*b*c", "/aXbYbZc"));
    }

    #[test]
    fn many_wildcards_do_not_blow_up() {
        let pattern = format!("/{}b", "*a".repeat(20));
        let rules = RobotsRules::parse(&format!("User-agent: *\nDisallow: {}\n", pattern));

        let started = std::time::Instant::now();
        assert!(rules.is_allowed("newsagent", &format!("/{}", "a".repeat(60))));
        assert!(!rules.is_allowed("newsagent", &format!("/{}b", "a".repeat(60))));
        assert!(started.elapsed() < std::time::Duration::from_secs(1));
    }

    #[test]
    fn fixed_policies() {
        assert!(RobotsRules::allow_all().is_allowed("newsagent", "/x"));
        assert!(!RobotsRules::disallow_all().is_allowed("newsagent", "/x"));
    }
}
