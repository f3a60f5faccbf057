//! Pages HTML minimales du parcours de connexion

use crate::models::{SectionMeta, ServerMeta};
use crate::pairing::PLEX_LINK_URL;
use htmlescape::encode_minimal;
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};

/// Délai de rafraîchissement de la page d'appairage (secondes)
pub const PAIRING_REFRESH_SECS: u32 = 5;

/// Encode un segment de chemin d'URL (noms de serveurs ou de sections)
///
/// Le résultat ne contient que des caractères alphanumériques et `%`, il peut
/// être placé tel quel dans un attribut `href`.
pub fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, NON_ALPHANUMERIC).to_string()
}

fn page(title: &str, head: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n{head}<title>{}</title>\n</head>\n<body>\n{body}\n</body>\n</html>\n",
        encode_minimal(title)
    )
}

/// Instructions d'appairage, la page se recharge jusqu'à authentification
pub fn pairing(pin: &str) -> String {
    let head = format!(
        "<meta http-equiv=\"refresh\" content=\"{}\" />\n",
        PAIRING_REFRESH_SECS
    );
    let body = format!(
        "<p>\n  Please visit <a href=\"{link}\">plex.tv/link</a> to pair.\n  Use the following code: <code>{pin}</code>\n</p>\n<p>This page refreshes automatically.</p>",
        link = PLEX_LINK_URL,
        pin = encode_minimal(pin),
    );
    page("Link your Plex account", &head, &body)
}

fn link_list(title: &str, route: &str, names: &[&str]) -> String {
    let body = if names.is_empty() {
        format!("<h1>{}</h1>\n<p>Nothing available.</p>", encode_minimal(title))
    } else {
        let items: String = names
            .iter()
            .map(|name| {
                format!(
                    "  <li><a href=\"{}/{}\">{}</a></li>\n",
                    route,
                    encode_segment(name),
                    encode_minimal(name)
                )
            })
            .collect();
        format!("<h1>{}</h1>\n<ul>\n{}</ul>", encode_minimal(title), items)
    };
    page(title, "", &body)
}

/// Liste des serveurs, chacun lié à `/select_server/{name}`
pub fn server_list(servers: &[ServerMeta]) -> String {
    let names: Vec<&str> = servers.iter().map(|s| s.name.as_str()).collect();
    link_list("Choose a server", "/select_server", &names)
}

/// Liste des sections, chacune liée à `/select_section/{title}`
pub fn section_list(sections: &[SectionMeta]) -> String {
    let names: Vec<&str> = sections.iter().map(|s| s.title.as_str()).collect();
    link_list("Choose a library", "/select_section", &names)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_segment() {
        assert_eq!(encode_segment("My Movies"), "My%20Movies");
        assert_eq!(encode_segment("a/b"), "a%2Fb");
        assert_eq!(encode_segment("Films & Séries"), "Films%20%26%20S%C3%A9ries");
    }

    #[test]
    fn test_pairing_page() {
        let html = pairing("AB<C");
        assert!(html.contains("https://www.plex.tv/link/"));
        assert!(html.contains("<code>AB&lt;C</code>"));
        assert!(html.contains("http-equiv=\"refresh\""));
    }

    #[test]
    fn test_server_list_links() {
        let servers = vec![ServerMeta {
            name: "Living <Room>".to_string(),
            scheme: "http".to_string(),
            host: "h".to_string(),
            port: "1".to_string(),
        }];
        let html = server_list(&servers);
        assert!(html.contains("href=\"/select_server/Living%20%3CRoom%3E\""));
        assert!(html.contains(">Living &lt;Room&gt;</a>"));
        assert!(html.contains("<title>Choose a server</title>"));
    }

    #[test]
    fn test_section_list_escapes_names() {
        let sections = vec![SectionMeta {
            key: "3".to_string(),
            title: "Tom & Jerry".to_string(),
            kind: "show".to_string(),
        }];
        let html = section_list(&sections);
        assert!(html.contains("href=\"/select_section/Tom%20%26%20Jerry\""));
        assert!(html.contains(">Tom &amp; Jerry</a>"));
        assert!(!html.contains("Tom & Jerry"));
    }

    #[test]
    fn test_empty_list() {
        let html = server_list(&[]);
        assert!(html.contains("Nothing available."));
        assert!(!html.contains("<ul>"));
    }
}
