use lazy_static::lazy_static;
use std::collections::{HashMap, HashSet};

use crate::article::Language;
use crate::entity::normalizer::normalize_text;

const ENGLISH: &str = "a about above after again against all am an and any are as at be because \
    been before being below between both but by can could did do does doing down during each \
    few for from further had has have having he her here hers herself him himself his how i if \
    in into is it its itself just me more most my myself no nor not now of off on once only or \
    other our ours ourselves out over own same she should so some such than that the their \
    theirs them themselves then there these they this those through to too under until up very \
    was we were what when where which while who whom why will with would you your yours \
    yourself yourselves also said says s t";

const FRENCH: &str = "a ai aie aient aies ait alors as au aucun aucune aupres aussi autre autres \
    aux avaient avais avait avant avec avez aviez avions avoir avons ayant c ca car ce ceci cela \
    celle celles celui ces cet cette ceux chaque ci comme comment d dans de des du deja deux \
    donc dont elle elles en encore entre est et etaient etais etait ete etes etre eu eux fait \
    faut il ils j je l la le les leur leurs lui m ma mais me meme mes moi mon n ne ni nos notre \
    nous on ont ou par pas peu peut plus pour pourquoi qu quand que quel quelle quelles quels \
    qui s sa sans se sera ses si sien son sont sous sur t ta te tes toi ton tous tout toute \
    toutes tres tu un une vers vos votre vous y";

const GERMAN: &str = "aber alle als am an auch auf aus bei bin bis da das dass dem den der des \
    die doch du ein eine einem einen einer er es fur hat hatte ich ihr im in ist ja kann mit \
    nach nicht noch nur oder sich sie sind so uber um und uns von vor war wie wir wird zu zum zur";

const SPANISH: &str = "a al algo como con de del el ella en es esta este fue ha hay la las le \
    lo los mas me mi muy no nos o para pero por que se si sin sobre su sus un una y ya";

const ITALIAN: &str = "a al alla anche che chi ci come con da del della dei di e ed gli ha ho i \
    il in la le lo ma mi ne non per piu quando se si sono su tra un una uno";

lazy_static! {
    static ref STOP_WORDS: HashMap<Language, HashSet<String>> = {
        let mut lists = HashMap::new();

        // Normalized like the tokens they are compared with
        let build = |words: &str| -> HashSet<String> {
            words.split_whitespace().map(normalize_text).collect()
        };
        lists.insert(Language::En, build(ENGLISH));
        lists.insert(Language::Fr, build(FRENCH));
        lists.insert(Language::De, build(GERMAN));
        lists.insert(Language::Es, build(SPANISH));
        lists.insert(Language::It, build(ITALIAN));

        lists
    };
}

/// Whether `token` is a stop-word of `language`. Without a language, the
/// English list is used.
pub fn is_stop_word(token: &str, language: Option<Language>) -> bool {
    let language = language.unwrap_or(Language::En);
    STOP_WORDS
        .get(&language)
        .map_or(false, |words| words.contains(token))
}
